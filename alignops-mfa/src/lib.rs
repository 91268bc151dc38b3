//! alignops-mfa: [Montreal Forced Aligner](https://montreal-forced-aligner.readthedocs.io)
//! process boundary.
//!
//! - [`align`]: [`align::MfaAligner`], the `mfa align` implementation of
//!   [`alignops_core::aligner::Aligner`]
//! - [`preflight`]: checks that the aligner, its models and the dataset are in place
//! - [`process`]: spawn, log capture and timeout handling
//!
//! ```no_run
//! use alignops_core::aligner::{AlignRequest, Aligner};
//! use alignops_mfa::align::MfaAligner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let aligner = MfaAligner::default().with_clean(true);
//! let run = aligner.align(&AlignRequest::new("mfa_data", "output_textgrids"))?;
//! println!("aligner {}", run.status);
//! # Ok(())
//! # }
//! ```

pub mod align;
pub mod preflight;
pub mod process;
