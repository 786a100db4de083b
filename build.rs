use clap::CommandFactory;
use clap_complete::{
    generate_to,
    shells::{Bash, Fish, Zsh},
};

#[cfg(unix)]
#[allow(dead_code)]
mod duration {
    include!("src/duration.rs");
}

#[cfg(unix)]
#[allow(dead_code)]
mod args {
    include!("src/args.rs");
}

#[cfg(unix)]
fn generate_completions() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let mut cmd = args::Args::command();
    generate_to(Bash, &mut cmd, "allping", &out_dir).unwrap();
    generate_to(Fish, &mut cmd, "allping", &out_dir).unwrap();
    generate_to(Zsh, &mut cmd, "allping", &out_dir).unwrap();
}

fn main() {
    #[cfg(unix)]
    generate_completions();
}
