mod classify;
mod optimize;
mod rewrite;
mod test_utils;
mod var_finder;
