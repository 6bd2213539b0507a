//! Stillpost – Kommandozeile
//!
//! Jeder Aufruf ist eine eigene Sitzung: `--als` meldet an, am Ende wird
//! abgemeldet und das Audit-Log geleert.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use stillpost_audit::AuditKategorie;
use stillpost_client::{config::ClientConfig, App};
use stillpost_core::Rolle;
use stillpost_messaging::Nachricht;
use stillpost_observability::logging_initialisieren;

/// Stillpost – anonyme, Ende-zu-Ende verschluesselte Nachrichten
#[derive(Parser)]
#[command(name = "stillpost", version, about)]
struct Cli {
    /// Pfad zur Konfigurationsdatei (sonst STILLPOST_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Identitaet fuer diesen Aufruf
    #[arg(long, global = true)]
    als: Option<String>,

    /// Ausgabe als JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    befehl: Befehl,
}

#[derive(Subcommand)]
enum Befehl {
    /// Schluessel-Paar erzeugen und Profil anlegen
    Registrieren {
        #[arg(long)]
        moderator: bool,
    },
    /// Nachricht verschluesselt senden
    Senden { an: String, text: String },
    /// Posteingang anzeigen (verschluesselt)
    Posteingang,
    /// Eine Nachricht des Posteingangs entschluesseln
    Entschluesseln { id: Uuid },
    /// Nachricht melden
    Melden {
        id: Uuid,
        #[arg(long, default_value = "")]
        grund: String,
    },
    /// Moderations-Warteschlange (Moderator)
    Gemeldet,
    /// Meldung verwerfen (Moderator)
    Verwerfen { token: String },
    /// Token einfrieren und Sperre anlegen (Moderator)
    Einfrieren { token: String },
    /// Audit-Log anzeigen (Moderator)
    Audit {
        /// auth, message, moderation oder all
        #[arg(long, default_value = "all")]
        kategorie: String,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Signatur eines Audit-Eintrags pruefen (Moderator)
    AuditPruefen { id: Uuid },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match ausfuehren(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fehler: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn ausfuehren(cli: Cli) -> Result<()> {
    let config_pfad = ClientConfig::pfad_bestimmen(cli.config);
    let config = ClientConfig::laden(&config_pfad)?;
    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Stillpost wird initialisiert"
    );

    let app = App::starten(config).await?;
    let ergebnis = befehl_ausfuehren(&app, cli.als.as_deref(), cli.json, cli.befehl).await;
    app.beenden().await;
    ergebnis
}

async fn befehl_ausfuehren(app: &App, als: Option<&str>, json: bool, befehl: Befehl) -> Result<()> {
    let als = als.context("--als <email> fehlt")?;

    if let Befehl::Registrieren { moderator } = befehl {
        let rolle = if moderator { Rolle::Moderator } else { Rolle::User };
        let session = app.registrieren(als, rolle).await?;
        return ausgeben(json, &session.email, || {
            format!("Registriert als {} ({rolle})", session.email)
        });
    }

    let session = app.anmelden(als).await?;
    let ich = session.email.as_str();

    match befehl {
        Befehl::Registrieren { .. } => Ok(()),
        Befehl::Senden { an, text } => {
            let nachricht = app.nachrichten().send(&text, &an, ich).await?;
            ausgeben(json, &nachricht, || {
                format!("Gesendet (Token {})", nachricht.token_id)
            })
        }
        Befehl::Posteingang => {
            let liste = app.nachrichten().retrieve(ich).await?;
            ausgeben(json, &liste, || nachrichten_text(&liste))
        }
        Befehl::Entschluesseln { id } => {
            let nachricht = app.entschluesseln(id).await?;
            ausgeben(json, &nachricht, || nachricht.content.clone())
        }
        Befehl::Melden { id, grund } => {
            let flag = app.moderation().flag(id, &grund, Some(ich)).await?;
            ausgeben(json, &flag, || format!("Gemeldet (Token {})", flag.token_id))
        }
        Befehl::Gemeldet => {
            app.moderator_sitzung().await?;
            let liste = app.moderation().flagged_messages(ich).await?;
            ausgeben(json, &liste, || nachrichten_text(&liste))
        }
        Befehl::Verwerfen { token } => {
            app.moderator_sitzung().await?;
            let erledigt = app.moderation().dismiss(&token, ich).await?;
            ausgeben(json, &erledigt, || entscheidung_text(erledigt, "verworfen"))
        }
        Befehl::Einfrieren { token } => {
            app.moderator_sitzung().await?;
            let erledigt = app.moderation().freeze(&token, ich).await?;
            ausgeben(json, &erledigt, || entscheidung_text(erledigt, "eingefroren"))
        }
        Befehl::Audit { kategorie, limit } => {
            app.moderator_sitzung().await?;
            let kategorie: AuditKategorie = kategorie.parse()?;
            let logs = app.audit_trail().logs(kategorie, limit).await?;
            ausgeben(json, &logs, || {
                logs.iter()
                    .map(|e| {
                        format!(
                            "{}  {}  {}  {}",
                            e.timestamp.to_rfc3339(),
                            e.event_type,
                            e.token_id.as_deref().unwrap_or("-"),
                            e.id
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Befehl::AuditPruefen { id } => {
            app.moderator_sitzung().await?;
            let bericht = app.audit_trail().verify(id).await?;
            ausgeben(json, &bericht, || format!("{}: {:?}", bericht.log_id, bericht.status))
        }
    }
}

fn ausgeben<T: Serialize>(json: bool, wert: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(wert)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn nachrichten_text(liste: &[Nachricht]) -> String {
    if liste.is_empty() {
        return "Keine Nachrichten".into();
    }
    liste
        .iter()
        .map(|n| {
            let inhalt = if n.is_encrypted {
                "[verschluesselt]"
            } else {
                n.content.as_str()
            };
            let status = n
                .flag_details
                .as_ref()
                .map(|f| format!("  [{:?}: {}]", f.status, f.reason))
                .unwrap_or_default();
            format!("{}  {}  {}  {inhalt}{status}", n.id, n.token_id, n.timestamp.to_rfc3339())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn entscheidung_text(erledigt: bool, aktion: &str) -> String {
    if erledigt {
        format!("Meldung {aktion}")
    } else {
        "Keine offene Meldung zu diesem Token".into()
    }
}
