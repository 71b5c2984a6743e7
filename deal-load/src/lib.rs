//! Load test for `POST /api/v1/deals/import`.
//!
//! Every iteration of a VU generates one synthetic FX deal, posts it as a JSON array and checks
//! that the import answered `201 Created` with `successCount == 1`, then pauses for the think
//! time.
pub mod cli;
pub mod deal;
pub mod import;
pub mod script;

pub use deal::{generate_payload, Deal, PayloadConfig, PayloadError};
pub use import::{check_response, post_deals, ImportError, ImportResponse, ImportResult};
pub use script::{import_deals, install, DealScript, ScriptError};
