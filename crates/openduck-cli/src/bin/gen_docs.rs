//! Binary that emits command-line options markdown to stdout.
//!
//! The docs build redirects this into `docs/command-line-options.md`.

fn main() {
    print!("{}", openduck_cli::render_options_markdown());
}
