// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod binds;
pub mod columns;
pub mod filter;
pub mod keys;
pub mod line_editor;
pub mod model;
pub mod runtime;
pub mod state;

pub use binds::*;
pub use columns::*;
pub use filter::*;
pub use keys::*;
pub use line_editor::*;
pub use model::*;
pub use runtime::*;
pub use state::*;
