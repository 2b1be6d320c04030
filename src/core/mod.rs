pub mod catalog;
pub mod charge;
pub mod checkout;
pub mod pricing;
pub mod quote;
pub mod rates;

pub use crate::domain::model::{Quote, QuoteInput};
pub use crate::domain::ports::{
    CatalogSource, CustomerDirectory, PaymentFunctions, QuoteRepository, Storage,
};
pub use crate::utils::error::Result;
