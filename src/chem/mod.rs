//! Cheminformatics helpers: SMILES parsing, formula/weight and 2-D drawing.

pub mod depict;
pub mod elements;
pub mod formula;
pub mod smiles;

pub use depict::Depiction;
pub use smiles::{MolGraph, SmilesError};
