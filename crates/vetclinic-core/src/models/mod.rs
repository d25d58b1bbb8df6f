//! Domain models for the clinic.

mod catalog;
mod clinic;
mod clinical;
mod grooming;
mod invoice;
mod lab_exam;
mod owner;
mod patient;
mod payment;
mod purchase;

pub use catalog::*;
pub use clinic::*;
pub use clinical::*;
pub use grooming::*;
pub use invoice::*;
pub use lab_exam::*;
pub use owner::*;
pub use patient::*;
pub use payment::*;
pub use purchase::*;
