use strum_macros::{Display, EnumIter, EnumString};

use crate::util::constants::{DEFAULT_HEAP_CELLS, HEADER_CELLS};

/// The collection strategy to use.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
pub enum PlanSelector {
    SemiSpace,
    MarkSweep,
    RefCount,
}

fn always_valid<T>(_: &T) -> bool {
    true
}

/// The prefix of environment variables that override option defaults, e.g. `CELLGC_HEAP_SIZE=64`.
pub const ENV_PREFIX: &str = "CELLGC_";

macro_rules! options {
    ($($(#[$outer:meta])* $name:ident: $type:ty [$validator:expr] = $default:expr),* $(,)?) => [
        /// Options of a plan. Every option has a default, which can be overridden by an
        /// environment variable (see [`ENV_PREFIX`]) or by [`Options::set_from_str`].
        #[derive(Clone, Debug)]
        pub struct Options {
            $($(#[$outer])* pub $name: $type),*
        }
        impl Options {
            /// Set an option from its name and a string value. Returns whether the value was
            /// accepted. A value that fails to parse or validate leaves the option unchanged.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    // Parse the given value from str (by env vars or by calling set_from_str()) to the right type
                    $(stringify!($name) => if let Ok(val) = val.parse::<$type>() {
                        // Validate
                        let validate_fn = $validator;
                        let is_valid = validate_fn(&val);
                        if is_valid {
                            // Only set value if valid.
                            self.$name = val;
                        } else {
                            warn!("Unable to set {}={:?}. Invalid value. Default value will be used.", s, val);
                        }
                        is_valid
                    } else {
                        warn!("Unable to set {}={:?}. Can't parse value. Default value will be used.", s, val);
                        false
                    })*
                    _ => {
                        warn!("Unknown option {}", s);
                        false
                    }
                }
            }

            /// Options with their built-in defaults, ignoring the environment.
            pub fn builtin() -> Self {
                Options {
                    $($name: $default),*
                }
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Options::builtin();

                // If we have env vars that start with CELLGC_ and match any option (such as CELLGC_HEAP_SIZE),
                // we set the option to its value (if it is a valid value). Otherwise, use the default value.
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(ENV_PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { options.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
                options
            }
        }
    ]
}

options! {
    /// The collection strategy.
    plan:               PlanSelector [always_valid] = PlanSelector::SemiSpace,
    /// The number of cells in the heap. A semi-space plan splits it into two equal regions, so
    /// it needs room for at least one header per region.
    heap_size:          usize        [|v: &usize| *v >= 2 * HEADER_CELLS] = DEFAULT_HEAP_CELLS,
    /// Keep an ordered log of reclaimed objects, drained by `Plan::take_reclaimed()`.
    record_reclamation: bool         [always_valid] = false,
    /// Verify the heap after every collection.
    sanity:             bool         [always_valid] = false,
}

impl Options {
    /// Shorthand for builtin options with the given plan and heap size.
    pub fn with_plan(plan: PlanSelector, heap_size: usize) -> Self {
        Options {
            plan,
            heap_size,
            ..Options::builtin()
        }
    }
}
