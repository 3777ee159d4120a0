//! Interface de linha de comando do surfadapt baseada em clap.
//!
//! Define a struct [`Cli`] com o arquivo de malha de entrada e as flags que
//! selecionam o modo do job (métrica, level-set ou parâmetros padrão).

use std::path::PathBuf;

use clap::Parser;

use crate::config::SurfadaptConfig;
use crate::mesh::SizeBounds;
use crate::state_machine::JobConfig;

/// surfadapt: adaptação de malhas de superfície guiada por métrica ou level-set.
#[derive(Debug, Parser)]
#[command(name = "surfadapt", version, about)]
pub struct Cli {
    /// Malha de entrada (.mesh, .meshb, .msh, .mshb, .vtu, .vtp, .pvtu, .pvtp).
    pub input: PathBuf,

    /// Malha de saída; padrão `<base>.o.<ext>`.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Arquivo de métrica de entrada; padrão `<base>.sol` quando existir.
    #[arg(long, value_name = "FILE")]
    pub metric: Option<PathBuf>,

    /// Arquivo de level-set de entrada.
    #[arg(long = "level-set", value_name = "FILE")]
    pub level_set: Option<PathBuf>,

    /// Discretiza o valor zero do level-set em vez de adaptar pela métrica.
    #[arg(long, alias = "ls")]
    pub iso: bool,

    /// Calcula os tamanhos a partir das arestas da malha de entrada.
    #[arg(long)]
    pub optim: bool,

    /// Tamanho constante das arestas.
    #[arg(long)]
    pub hsiz: Option<f64>,

    /// Tamanho mínimo das arestas.
    #[arg(long)]
    pub hmin: Option<f64>,

    /// Tamanho máximo das arestas.
    #[arg(long)]
    pub hmax: Option<f64>,

    /// Distância de Hausdorff global (sobrepõe o arquivo de configuração).
    #[arg(long)]
    pub hausd: Option<f64>,

    /// Gradação de tamanho (sobrepõe o arquivo de configuração).
    #[arg(long)]
    pub hgrad: Option<f64>,

    /// Salva os parâmetros padrão em `<base>.mmgs` sem adaptar a malha.
    #[arg(long = "default-params")]
    pub default_params: bool,

    /// Nível de verbosidade (-1 silencioso, 1 normal, >=5 debug).
    #[arg(long, short, allow_negative_numbers = true, value_name = "N")]
    pub verbose: Option<i32>,

    /// Caminho do arquivo de configuração; padrão `surfadapt.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Imprime o relatório JSON do job ao final.
    #[arg(long)]
    pub report: bool,
}

impl Cli {
    /// Verbosidade efetiva: a flag vence o arquivo de configuração.
    pub fn verbosity(&self, config: &SurfadaptConfig) -> i32 {
        self.verbose.unwrap_or(config.verbosity)
    }

    /// Constrói a configuração do job combinando as flags com `config`.
    pub fn into_job_config(self, config: &SurfadaptConfig) -> JobConfig {
        let verbosity = self.verbosity(config);
        let mut job = JobConfig::new(self.input);
        job.mesh_out = self.output;
        job.metric_in = self.metric;
        job.level_set_in = self.level_set;
        job.verbosity = verbosity;
        job.iso = self.iso;
        job.optim = self.optim;
        job.mark = self.default_params;
        job.bounds = SizeBounds {
            hmin: self.hmin,
            hmax: self.hmax,
            hausd: self.hausd.unwrap_or(config.hausd),
            hgrad: self.hgrad.unwrap_or(config.hgrad),
            hsiz: self.hsiz,
        };
        job
    }
}
