//! ctn-orders
//!
//! The money paths: order submission and order fulfillment.
//!
//! [`SubmissionFlow`] drives a single order attempt through an explicit
//! state machine (validate locally, create the preorder, debit the stored
//! balance) and is the only place in the workspace where the non-atomic
//! create-then-debit sequence lives. [`fulfillment`] is the vendor side:
//! look up a student's pending preorders by cédula and mark them delivered.

pub mod fulfillment;
mod submission;

pub use fulfillment::{mark_delivered, pending_for_cedula, FulfillmentError};
pub use submission::{
    Confirmation, SubmissionFlow, SubmissionPhase, SubmitError, ValidationError,
};
