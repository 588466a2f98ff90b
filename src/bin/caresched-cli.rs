#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use caresched::{
    calendar, io,
    model::{CaregiverId, ClientId, Dataset},
    scheduler::{BulkCreateRequest, ConflictQuery, Engine, EngineOptions, SuggestRequest},
    storage::{JsonStorage, Storage},
    template::load_template_from_file,
};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des intervenants (dataset JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du dataset
    #[arg(long, global = true, default_value = "caresched.json")]
    data: String,

    /// Date du jour (YYYY-MM-DD), par défaut aujourd'hui (UTC)
    #[arg(long, global = true)]
    today: Option<String>,

    /// Seuil d'approche des heures supplémentaires
    #[arg(long, global = true, default_value_t = 35.0)]
    overtime_threshold: f64,

    /// Durée estimée (h) d'une suggestion sans plage horaire
    #[arg(long, global = true, default_value_t = 4.0)]
    default_shift_hours: f64,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classer les intervenants pour un créneau
    Suggest {
        /// id ou nom du bénéficiaire
        #[arg(long)]
        client: String,
        #[arg(long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long)]
        start: Option<String>,
        /// HH:MM
        #[arg(long)]
        end: Option<String>,
    },

    /// Remplir automatiquement les créneaux ouverts d'une période
    AutoFill {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Simulation : aucune écriture
        #[arg(long)]
        dry_run: bool,
        /// Export CSV du rapport (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Vérifier les conflits d'un intervenant sur une plage
    Check {
        /// id ou nom de l'intervenant
        #[arg(long)]
        caregiver: String,
        #[arg(long)]
        date: Option<String>,
        /// 0-6 (0 = dimanche) ou nom du jour
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Grille hebdomadaire par intervenant
    Week {
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Créer des entrées ponctuelles depuis un modèle hebdomadaire JSON
    BulkCreate {
        #[arg(long)]
        caregiver: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        template: String,
        #[arg(long, default_value_t = 4)]
        weeks: u32,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Heures de la semaine d'un intervenant
    Hours {
        #[arg(long)]
        caregiver: String,
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Taux d'utilisation et déficit d'unités autorisées
    Coverage {
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Chevauchements existants dans le planning persisté
    Audit {
        #[arg(long)]
        week_of: Option<String>,
    },

    /// Importer des intervenants depuis un CSV
    ImportCaregivers {
        #[arg(long)]
        csv: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_opt_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(calendar::parse_date).transpose()
}

fn resolve_caregiver(dataset: &Dataset, key: &str) -> CaregiverId {
    dataset
        .find_caregiver_by_name(key)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| CaregiverId::new(key))
}

fn resolve_client(dataset: &Dataset, key: &str) -> ClientId {
    dataset
        .find_client_by_name(key)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| ClientId::new(key))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.data)?;
    let dataset = if storage.path().exists() {
        storage.load()?
    } else {
        Dataset::default()
    };

    let today = match cli.today.as_deref() {
        Some(raw) => calendar::parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let now = if cli.today.is_some() {
        today
            .and_hms_opt(12, 0, 0)
            .context("invalid noon conversion")?
            .and_utc()
    } else {
        Utc::now()
    };
    let options = EngineOptions {
        overtime_threshold_hours: cli.overtime_threshold,
        default_shift_hours: cli.default_shift_hours,
        ..EngineOptions::default()
    };

    let code = match cli.cmd {
        Commands::Suggest {
            client,
            date,
            start,
            end,
        } => {
            let req = SuggestRequest {
                client_id: Some(resolve_client(&dataset, &client)),
                date: parse_opt_date(date.as_deref())?,
                start_time: start.as_deref().map(calendar::parse_time).transpose()?,
                end_time: end.as_deref().map(calendar::parse_time).transpose()?,
            };
            let engine = Engine::with_options(dataset, options);
            print_json(&engine.suggest_caregivers(&req, today)?)?;
            0
        }
        Commands::AutoFill {
            from,
            to,
            dry_run,
            report,
        } => {
            let start = calendar::parse_date(&from)?;
            let end = calendar::parse_date(&to)?;
            let mut engine = Engine::with_options(dataset, options);
            let result = engine.auto_fill(start, end, dry_run, now)?;
            if let Some(path) = report {
                io::export_autofill_csv(path, &result)?;
            }
            if !dry_run {
                storage.save(engine.store())?;
            }
            print_json(&result)?;
            if result.failed > 0 {
                // Code 2 = WARNING/INCOMPLETE
                2
            } else {
                0
            }
        }
        Commands::Check {
            caregiver,
            date,
            day,
            start,
            end,
        } => {
            let query = ConflictQuery {
                caregiver_id: Some(resolve_caregiver(&dataset, &caregiver)),
                date: parse_opt_date(date.as_deref())?,
                day_of_week: day.as_deref().map(calendar::parse_weekday).transpose()?,
                start_time: Some(calendar::parse_time(&start)?),
                end_time: Some(calendar::parse_time(&end)?),
            };
            let engine = Engine::with_options(dataset, options);
            let report = engine.check_conflicts(&query)?;
            print_json(&report)?;
            if report.has_conflict {
                2
            } else {
                0
            }
        }
        Commands::Week { week_of } => {
            let week_of = parse_opt_date(week_of.as_deref())?.unwrap_or(today);
            let engine = Engine::with_options(dataset, options);
            print_json(&engine.week_view(week_of)?)?;
            0
        }
        Commands::BulkCreate {
            caregiver,
            client,
            template,
            weeks,
            start_date,
            notes,
        } => {
            let template = load_template_from_file(&template)?;
            let req = BulkCreateRequest {
                caregiver_id: resolve_caregiver(&dataset, &caregiver),
                client_id: resolve_client(&dataset, &client),
                template: template.slots,
                weeks,
                start_date: parse_opt_date(start_date.as_deref())?.unwrap_or(today),
                notes,
            };
            let mut engine = Engine::with_options(dataset, options);
            let report = engine.bulk_create(&req, today)?;
            if report.created > 0 {
                storage.save(engine.store())?;
            }
            print_json(&report)?;
            0
        }
        Commands::Hours { caregiver, week_of } => {
            let id = resolve_caregiver(&dataset, &caregiver);
            let week_of = parse_opt_date(week_of.as_deref())?.unwrap_or(today);
            let engine = Engine::with_options(dataset, options);
            print_json(&engine.caregiver_hours(&id, week_of)?)?;
            0
        }
        Commands::Coverage { week_of } => {
            let week_of = parse_opt_date(week_of.as_deref())?.unwrap_or(today);
            let engine = Engine::with_options(dataset, options);
            print_json(&engine.coverage_overview(week_of)?)?;
            0
        }
        Commands::Audit { week_of } => {
            let week_of = parse_opt_date(week_of.as_deref())?.unwrap_or(today);
            let engine = Engine::with_options(dataset, options);
            let overlaps = engine.audit_week(week_of)?;
            if overlaps.is_empty() {
                println!("OK: no overlapping entries");
                0
            } else {
                eprintln!("Found {} overlap(s)", overlaps.len());
                print_json(&overlaps)?;
                2
            }
        }
        Commands::ImportCaregivers { csv } => {
            let mut dataset = dataset;
            let caregivers = io::import_caregivers_csv(csv)?;
            let n = caregivers.len();
            dataset.caregivers.extend(caregivers);
            storage.save(&dataset)?;
            println!("Imported {n} caregiver(s)");
            0
        }
    };

    std::process::exit(code);
}
