mod cli_pipe;
#[allow(dead_code)]
mod common;
mod config_file;
mod loki_push;
