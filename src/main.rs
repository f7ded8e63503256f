//=====================================================
// File: main.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Native bridge CLI entry point
// Objective: Exercise Net::HTTP and native plugins from the command line
//            through the same context the VM uses
//=====================================================

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use solvra_bridge::builtins::HTTP_CLASS;
use solvra_bridge::{BridgeConfig, BridgeContext, ScriptValue, logging};

#[derive(Parser, Debug)]
#[command(name = "solvra-bridge", about = "SolvraScript native bridge CLI")]
pub struct Args {
    /// Bridge configuration file (defaults to <config_dir>/solvra/bridge.toml).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch `domain` + `path` with Net::HTTP.get.
    Get(GetArgs),
    /// Send `body` to `url` with Net::HTTP.post.
    Post(PostArgs),
    /// Import a plugin and send one symbol with text arguments.
    Send(SendArgs),
    /// Import a plugin and list its exported symbols.
    Symbols(SymbolsArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GetArgs {
    pub domain: String,
    pub path: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PostArgs {
    pub url: String,
    pub content_type: String,
    pub body: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SendArgs {
    /// Plugin location specifier.
    pub plugin: String,
    pub symbol: String,
    pub args: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SymbolsArgs {
    /// Plugin location specifier.
    pub plugin: String,
}

fn main() -> Result<ExitCode> {
    logging::init("solvra-bridge");
    let args = Args::parse();

    let mut config = BridgeConfig::load(args.config.as_deref()).context("loading bridge config")?;
    config.apply_env();
    let mut ctx = BridgeContext::new(config);

    let result = match args.command {
        Command::Get(cmd) => {
            let mut call_args = vec![ScriptValue::from(cmd.domain)];
            call_args.extend(cmd.path.map(ScriptValue::from));
            ctx.call_class_method(HTTP_CLASS, "get", &call_args)
        }
        Command::Post(cmd) => ctx.call_class_method(
            HTTP_CLASS,
            "post",
            &[cmd.url.into(), cmd.content_type.into(), cmd.body.into()],
        ),
        Command::Send(cmd) => {
            let plugin = ctx.call_function("import", &[cmd.plugin.into()]);
            let mut call_args = vec![ScriptValue::from(cmd.symbol)];
            call_args.extend(cmd.args.into_iter().map(ScriptValue::from));
            ctx.call_method(&plugin, "send", &call_args)
        }
        Command::Symbols(cmd) => {
            let plugin = ctx.call_function("import", &[cmd.plugin.into()]);
            match plugin.as_plugin().map(|handle| ctx.plugins().symbols(handle)) {
                Some(Ok(symbols)) => ScriptValue::from(symbols.join("\n")),
                Some(Err(err)) => err.into(),
                None => plugin,
            }
        }
    };

    Ok(report(&result))
}

fn report(value: &ScriptValue) -> ExitCode {
    match value {
        ScriptValue::Error(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
        ScriptValue::Unit => ExitCode::SUCCESS,
        other => {
            println!("{other}");
            ExitCode::SUCCESS
        }
    }
}
