use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;
use simmer_core::{Config, CookMode, EggVariant, PastaVariant, SauceVariant};

use super::session::{self, SessionOptions};
use super::CliResult;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CookModeArg {
    Pasta,
    Egg,
    Sauce,
    Custom,
}

impl From<CookModeArg> for CookMode {
    fn from(arg: CookModeArg) -> Self {
        match arg {
            CookModeArg::Pasta => CookMode::Pasta,
            CookModeArg::Egg => CookMode::Egg,
            CookModeArg::Sauce => CookMode::Sauce,
            CookModeArg::Custom => CookMode::Custom,
        }
    }
}

#[derive(Debug, Args)]
pub struct CookArgs {
    /// What to cook
    #[arg(value_enum)]
    mode: CookModeArg,
    /// Variant id from `simmer catalog` (e.g. "thin", "soft", "slow")
    #[arg(long)]
    variant: Option<String>,
}

fn parse_variant<T: DeserializeOwned>(mode: CookMode, id: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(id.to_string()))
        .map_err(|_| format!("unknown {} variant '{id}'", mode.label().to_lowercase()))
}

pub async fn run(args: CookArgs) -> CliResult {
    let config = Config::load()?;
    let mode = CookMode::from(args.mode);
    let mut router = config.cook_router()?;

    if let Some(id) = args.variant.as_deref() {
        match mode {
            CookMode::Pasta => router.set_pasta_variant(parse_variant::<PastaVariant>(mode, id)?),
            CookMode::Egg => router.set_egg_variant(parse_variant::<EggVariant>(mode, id)?),
            CookMode::Sauce => router.set_sauce_variant(parse_variant::<SauceVariant>(mode, id)?),
            CookMode::Custom => {
                return Err("custom stages have no variants; edit cook.custom_stages".into())
            }
        }
    }
    router.select(mode);
    tracing::debug!(?mode, "starting cook timer");

    session::run(router, SessionOptions::default()).await
}
