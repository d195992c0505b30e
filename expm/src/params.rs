//! Command-line parameters.

use std::path::PathBuf;
use std::thread;

use crate::config::{ExpmConfig, KernelConfig, effective_tolerance};
use crate::{ConfigError, DEFAULT_CACHE_ELEMENTS, DEFAULT_TOLERANCE};

#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub seed: u64,
    pub order: usize,
    pub output: PathBuf,
    pub tolerance: f64,
    pub workers: usize,
    pub cache_elements: usize,
}

impl Params {
    /// Parses `-s seed -n order -o output [-t tolerance] [-p workers]
    /// [-c cache_elements]`, program name already stripped.
    ///
    /// A missing or non-positive tolerance becomes [`DEFAULT_TOLERANCE`].
    /// Without `-p` the worker count is the available parallelism, capped at
    /// the matrix order.
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() < 3 {
            return Err(ConfigError::MissingArguments);
        }

        let mut seed = None;
        let mut order = None;
        let mut output = None;
        let mut tolerance = DEFAULT_TOLERANCE;
        let mut workers = None;
        let mut cache_elements = DEFAULT_CACHE_ELEMENTS;

        let mut iter = args.into_iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "-s" => match value_of(&mut iter, &flag)?.parse::<u64>() {
                    Ok(s) if s > 0 => seed = Some(s),
                    _ => return Err(ConfigError::InvalidSeed),
                },
                "-n" => match value_of(&mut iter, &flag)?.parse::<usize>() {
                    Ok(n) if n > 0 => order = Some(n),
                    _ => return Err(ConfigError::InvalidOrder),
                },
                "-o" => {
                    let value = value_of(&mut iter, &flag)?;
                    if value.is_empty() {
                        return Err(ConfigError::InvalidOutput);
                    }
                    output = Some(PathBuf::from(value));
                }
                "-t" => {
                    let value = value_of(&mut iter, &flag)?;
                    tolerance = effective_tolerance(value.parse().unwrap_or(0.0));
                }
                "-p" => match value_of(&mut iter, &flag)?.parse::<usize>() {
                    Ok(p) if p > 0 => workers = Some(p),
                    _ => return Err(ConfigError::InvalidWorkers),
                },
                "-c" => match value_of(&mut iter, &flag)?.parse::<usize>() {
                    Ok(c) if c > 0 => cache_elements = c,
                    _ => return Err(ConfigError::InvalidCacheElements),
                },
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            }
        }

        let seed = seed.ok_or(ConfigError::MissingOption("-s"))?;
        let order = order.ok_or(ConfigError::MissingOption("-n"))?;
        let output = output.ok_or(ConfigError::MissingOption("-o"))?;
        let workers = workers.unwrap_or_else(|| {
            let available = thread::available_parallelism().map_or(1, |n| n.get());
            available.min(order)
        });

        Ok(Self {
            seed,
            order,
            output,
            tolerance,
            workers,
            cache_elements,
        })
    }

    pub fn expm_config(&self) -> ExpmConfig {
        ExpmConfig::new(self.workers)
            .with_tolerance(self.tolerance)
            .with_kernel(KernelConfig {
                cache_elements: self.cache_elements,
            })
    }
}

fn value_of(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    iter.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

pub fn usage(program: &str) -> String {
    format!(
        "USAGE: {} -s seed -n dimension -o output-filename [-t tolerance] [-p workers] [-c cache-elements]",
        program
    )
}
