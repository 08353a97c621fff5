pub mod error;
pub mod subprocess;

pub use bstr::{BStr, BString, ByteSlice};
pub use error::UtilError;
pub use subprocess::{StdioMode, ToolCommand, ToolOutput};

pub type Result<T> = std::result::Result<T, UtilError>;
