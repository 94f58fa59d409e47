//! Container and markup plumbing for the workbook readers.

pub(crate) mod xml;
pub(crate) mod zip;
