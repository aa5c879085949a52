pub mod logs;
pub mod openclaw;
pub mod providers;
pub mod updates;

use crate::types::IpcError;

type CommandResult<T> = Result<T, IpcError>;
