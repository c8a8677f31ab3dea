//! Send single HTTP requests against a configured base URL and assert on the
//! status code and fields of the response.
//!
//! ```no_run
//! use api_quest::Harness;
//! use api_quest::RequestSpec;
//! use api_quest::asserter::assert_field;
//! use api_quest::asserter::assert_status;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let harness = Harness::configure("https://reqres.in")?;
//! let resp = harness
//!     .send(&RequestSpec::post("/api/users").json(json!({ "name": "morpheus", "job": "leader" })))
//!     .await?;
//!
//! assert_status(&resp, 201)?;
//! assert_field(&resp, "name", "morpheus")?;
//! # Ok(())
//! # }
//! ```

pub mod asserter;
pub mod config;
pub mod harness;
pub mod json_path;
pub mod outputter;
pub mod parser;
pub mod request;
pub mod response;
pub mod runner;
pub mod validator;

pub use crate::asserter::AssertionError;
pub use crate::config::Config;
pub use crate::harness::Harness;
pub use crate::harness::HarnessError;
pub use crate::request::RequestSpec;
pub use crate::response::CapturedResponse;
