// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Utility Billing Email Extraction
//!
//! Parses utility-service billing emails (water, gas, electricity,
//! telecom) and extracts a normalized attribute record from their
//! loosely structured bodies.
//!
//! # Features
//!
//! - MIME normalization: plain-text preferred, HTML stripped with
//!   double entity decoding
//! - Provider classification from sender/subject patterns
//! - Generic label-based attribute extraction
//! - Provider-layout overrides (packed tables, plain-number amounts,
//!   in-body invoice sentences)
//! - Inbox-scan service detection with deduplication
//!
//! # Example
//!
//! ```rust
//! use boleta_extract::{classify, extract, parse_message};
//!
//! let raw = b"From: Metrogas <boleta@metrogas.cl>\r\n\
//!             Subject: Boleta Metrogas Nro. 0000000061778648\r\n\
//!             Date: Mon, 12 Jan 2026 10:00:00 -0300\r\n\
//!             \r\n\
//!             Total a pagar: 24580";
//! let email = parse_message(raw).unwrap();
//!
//! let service = classify(&email.from.to_string(), &email.subject);
//! let record = extract(service.service_type, &email.subject, &email.body_text);
//!
//! assert_eq!(record.text("folio"), Some("0000000061778648"));
//! assert_eq!(record.integer("total_amount"), Some(24580));
//! ```

mod classify;
mod error;
mod extract;
mod parser;
mod types;

pub use classify::{
    classify, classify_service_type, detect_services, is_billing_email, match_first,
    Classification, ServicePattern,
};
pub use error::{ParseError, Result};
pub use extract::{
    extract, extract_for_service, extract_generic, registry, ElectricityExtractor, GasExtractor,
    TypedExtractor, WaterExtractor,
};
pub use parser::parse_message;
pub use types::*;
