pub(crate) mod attest;
pub(crate) mod demo;
pub(crate) mod show_params;
