//! Plumbing around the path rules: running `gpg`, asking `git` about ignored
//! files, and finding every secret in a repository.

pub mod git;
mod gpg;
mod process;
pub mod search;
mod secret;

pub use crate::{
    gpg::Gpg,
    secret::{Secret, SecretKeeper, absolute},
};
