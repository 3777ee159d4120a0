use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::SplitWhitespace;

use super::{DEFAULT_SIDE_CAR, EntityType, LocalParameter, LocalParameters, side_car_path};
use crate::error::{AdaptError, AdaptResult};

/// Read the side-car of `mesh_path`, falling back to `DEFAULT.mmgs` in `fallback_dir`.
///
/// A missing side-car is not an error and yields an empty set. Once a file is
/// opened, every record in it must parse or the whole read fails.
pub fn read_local_params(mesh_path: &Path, fallback_dir: &Path) -> AdaptResult<LocalParameters> {
    let candidates = [side_car_path(mesh_path), fallback_dir.join(DEFAULT_SIDE_CAR)];

    for path in candidates {
        match fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "%% side-car OPENED");
                return parse_local_params(&path, &contents);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(AdaptError::read(path, e.to_string())),
        }
    }

    tracing::debug!("no local parameter file");
    Ok(LocalParameters::default())
}

/// Parse side-car text. `path` is only used in diagnostics.
///
/// Only the `parameters` keyword is understood; any other top-level token is
/// skipped so newer sections do not break older readers.
pub fn parse_local_params(path: &Path, contents: &str) -> AdaptResult<LocalParameters> {
    let mut tokens = Tokens {
        path,
        inner: contents.split_whitespace(),
    };
    let mut params = LocalParameters::default();

    while let Some(token) = tokens.inner.next() {
        if !token.eq_ignore_ascii_case("parameters") {
            tracing::debug!(token, "skipping unknown side-car keyword");
            continue;
        }

        let declared: usize = tokens.parse("parameter count")?;
        params = LocalParameters::with_declared(declared);

        for _ in 0..declared {
            let record = tokens.record()?;
            params
                .register(record)
                .map_err(|e| AdaptError::malformed(path, e.to_string()))?;
        }
    }

    Ok(params)
}

struct Tokens<'a> {
    path: &'a Path,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next(&mut self, what: &str) -> AdaptResult<&'a str> {
        self.inner
            .next()
            .ok_or_else(|| AdaptError::malformed(self.path, format!("missing {what}")))
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &str) -> AdaptResult<T> {
        let token = self.next(what)?;
        token
            .parse()
            .map_err(|_| AdaptError::malformed(self.path, format!("invalid {what} `{token}`")))
    }

    /// `<ref> <entity> <hmin> <hmax> <hausd>`
    fn record(&mut self) -> AdaptResult<LocalParameter> {
        let reference: i32 = self.parse("reference")?;
        let keyword = self.next("entity type")?;
        let entity = EntityType::from_keyword(keyword).ok_or_else(|| {
            AdaptError::malformed(self.path, format!("unknown entity type `{keyword}`"))
        })?;
        let hmin: f64 = self.parse("hmin")?;
        let hmax: f64 = self.parse("hmax")?;
        let hausd: f64 = self.parse("hausd")?;

        Ok(LocalParameter {
            entity,
            reference,
            hmin,
            hmax,
            hausd,
        })
    }
}
