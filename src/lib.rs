// SPDX-License-Identifier: MIT

//! Ready-to-run agent templates on top of a small orchestration layer

pub mod adk;
pub mod templates;
