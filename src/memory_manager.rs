//! The client-facing API.
//!
//! A client configures [`Options`], creates a plan, and drives it through the
//! [`Plan`](crate::plan::Plan) trait: declaring Vars, allocating, and reading and writing fields.
//! The functions here cover setup and the operations that are not tied to one Var.

use crate::plan::Plan;
use crate::util::error::Result;
use crate::util::options::Options;
use crate::vm::{RootSet, ScopeStack};

/// Create the plan selected by `options`, with a fresh [`ScopeStack`] for its roots.
///
/// This attempts to initialize a logger. A client that wants its own logger should install it
/// before calling this.
pub fn create_plan(options: Options) -> Box<dyn Plan<Roots = ScopeStack>> {
    init_logger();
    crate::plan::create_plan(options)
}

/// Create the plan selected by `options` over a client-supplied root set.
pub fn create_plan_with_roots<R: RootSet + 'static>(
    options: Options,
    roots: R,
) -> Box<dyn Plan<Roots = R>> {
    init_logger();
    crate::plan::create_plan_with_roots(options, roots)
}

/// Install the built-in logger, unless another logger is already in place.
pub fn init_logger() {
    match crate::util::logger::try_init() {
        Ok(_) => debug!("cellgc initialized the logger."),
        Err(_) => debug!(
            "cellgc failed to initialize the logger. Possibly a logger has been initialized by user."
        ),
    }
}

/// Set an option by name. Returns false if the name is unknown or the value is invalid.
///
/// Arguments:
/// * `options`: The options to update.
/// * `name`: The name of the option, e.g. `heap_size`.
/// * `value`: The value of the option, as a string.
pub fn process(options: &mut Options, name: &str, value: &str) -> bool {
    options.set_from_str(name, value)
}

/// Set multiple options from a string of whitespace-separated `name=value` pairs. Returns false
/// if any pair could not be applied. The pairs before it are still applied.
pub fn process_bulk(options: &mut Options, pairs: &str) -> bool {
    for pair in pairs.split_ascii_whitespace() {
        let Some((name, value)) = pair.split_once('=') else {
            warn!("Malformed option {:?}, expected name=value", pair);
            return false;
        };
        if !options.set_from_str(name, value) {
            return false;
        }
    }
    true
}

/// Trigger a collection on behalf of the client, as if an allocation had failed.
pub fn handle_user_collection_request<R: RootSet>(plan: &mut dyn Plan<Roots = R>) -> Result<()> {
    debug!("{}: user triggered collection", plan.constraints().name);
    plan.collect()
}
