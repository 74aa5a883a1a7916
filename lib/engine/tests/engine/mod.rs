mod compile;
mod errors;
mod filter_placement;
mod laws;
mod modifiers;
mod properties;
mod test_utils;
