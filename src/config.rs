//! Configuração do surfadapt carregada a partir de `surfadapt.toml`.
//!
//! A struct [`SurfadaptConfig`] contém os valores padrão globais de um job.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `SURFADAPT_VERBOSITY` tem precedência sobre o arquivo,
//! e as flags da linha de comando têm precedência sobre ambos.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Nome do arquivo procurado no diretório atual.
pub const CONFIG_FILE: &str = "surfadapt.toml";

/// Configuração de nível superior carregada de `surfadapt.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfadaptConfig {
    /// Nível de verbosidade padrão (-1 silencioso, 1 normal, >=5 debug).
    #[serde(default = "default_verbosity")]
    pub verbosity: i32,

    /// Distância de Hausdorff global.
    #[serde(default = "default_hausd")]
    pub hausd: f64,

    /// Gradação de tamanho entre arestas adjacentes.
    #[serde(default = "default_hgrad")]
    pub hgrad: f64,

    /// Imprime o relatório JSON do job ao final.
    #[serde(default)]
    pub report: bool,
}

// Valor padrão para a verbosidade: 1.
fn default_verbosity() -> i32 {
    1
}

// Valor padrão para a distância de Hausdorff: 0.01.
fn default_hausd() -> f64 {
    0.01
}

// Valor padrão para a gradação: 1.3.
fn default_hgrad() -> f64 {
    1.3
}

impl Default for SurfadaptConfig {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            hausd: default_hausd(),
            hgrad: default_hgrad(),
            report: false,
        }
    }
}

impl SurfadaptConfig {
    /// Carrega a configuração de `path`, ou de `surfadapt.toml` no diretório atual.
    /// Usa valores padrão se o arquivo implícito não existir; um arquivo
    /// explícito ausente é um erro.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        Ok(config.with_verbosity_override(std::env::var("SURFADAPT_VERBOSITY").ok().as_deref()))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<SurfadaptConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Aplica o valor da variável de ambiente quando ele é um inteiro válido.
    pub fn with_verbosity_override(mut self, value: Option<&str>) -> Self {
        if let Some(v) = value.and_then(|v| v.trim().parse::<i32>().ok()) {
            self.verbosity = v;
        }
        self
    }
}
