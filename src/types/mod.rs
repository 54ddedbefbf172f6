pub mod call;
pub mod request;
pub mod target;

pub use call::{CallArgument, CallInfo, Definition, Location, TypeArgument, TypeOrigin};
pub(crate) use call::tokens_text;
pub use request::ComparatorRequest;
pub use target::{Target, TargetParseError};
