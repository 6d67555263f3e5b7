//! Message analysis for the utility agent
//!
//! This crate provides the deterministic classifiers that run on every turn:
//! - **Contract Identifier**: water/electricity contract numbers in free text
//! - **Service Classifier**: which service(s) a message is about
//! - **Language Inferencer**: reply language with session stickiness
//! - **Payment intent**: explicit "pay now" detection
//!
//! # Example
//!
//! ```
//! use utility_agent_text_processing::{classify, find_contracts, infer_language};
//! use utility_agent_core::{Language, ServiceScope};
//!
//! let text = "مشكل الكهرباء 4801566997 / 2025982";
//! assert_eq!(classify(text), ServiceScope::Electricity);
//! assert!(find_contracts(text).electricity.is_some());
//! assert_eq!(infer_language(text, &[]), Language::Arabic);
//! ```

pub mod contract;
pub mod intent;
pub mod language;
pub mod service;

pub use contract::{find_contract_mentions, find_contracts, ContractMatches, ContractMentions};
pub use intent::{PaymentIntent, PaymentIntentDetector};
pub use language::{has_darija_markers, has_french_markers, infer_language};
pub use service::{classify, classify_with_history};
