mod login;
mod logout;
mod request;
mod resource;
mod status;

pub use login::{run_login, run_refresh};
pub use logout::run_logout;
pub use request::run_request;
pub use resource::{run_delete, run_get, run_list, run_me};
pub use status::run_status;

use anyhow::{Context, Result};
use serde_json::Value;

/// Print a response payload as pretty JSON, or a short note when there is none.
pub(crate) fn print_payload(payload: Option<Value>) -> Result<()> {
    match payload {
        Some(value) => {
            let text =
                serde_json::to_string_pretty(&value).context("Failed to format response")?;
            println!("{}", text);
        }
        None => println!("✅ Done (no content)."),
    }
    Ok(())
}
