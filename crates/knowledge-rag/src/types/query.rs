//! Request parameter types
//!
//! Both endpoints take their input from the query string.

use serde::{Deserialize, Serialize};

/// Parameters for `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// The question to answer
    pub q: String,
}

/// Parameters for `POST /add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddParams {
    /// Raw text to store in the knowledge base
    pub text: String,
}
