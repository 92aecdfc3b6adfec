//! Centriq CLI: command-line client for the Centriq gallery backend.
//!
//! Settings come from CENTRIQ_* environment variables (a `.env` file is read
//! first). The session is restored from CENTRIQ_TOKEN + CENTRIQ_USER_NAME or
//! from the session file written by `centriq login`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use centriq_api_client::ApiClient;
use centriq_cli::{init_tracing, log_error, ErrorReport};
use centriq_core::models::{GalleryScope, ProfileUpdate, SourceFile};
use centriq_core::{AppError, ClientConfig, CollectionService, MediaService, Session};
use centriq_gallery::{ActivityPhotoUploader, Collections, Gallery, UploadEvent, UploadPipeline};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "centriq", about = "Centriq gallery CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and persist the session
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// Change the display name or profile picture
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        picture_url: Option<String>,
    },
    /// Delete the account and forget the session
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Manage trips
    Trips {
        #[command(subcommand)]
        action: TripCommand,
    },
    /// Show the current identity
    Whoami {
        /// Ask the backend for the profile instead of trusting the session
        #[arg(long)]
        refresh: bool,
    },
    /// Upload images and videos
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Trip to attach the files to (unsorted when omitted)
        #[arg(long)]
        trip: Option<Uuid>,
    },
    /// List one page of a trip, unsorted media or favorites
    List {
        #[arg(long, conflicts_with_all = ["unsorted", "favorites"])]
        trip: Option<Uuid>,
        #[arg(long, conflicts_with = "favorites")]
        unsorted: bool,
        #[arg(long)]
        favorites: bool,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Mark one media item as favorite (or clear it with --unset)
    Favorite {
        id: Uuid,
        #[arg(long)]
        unset: bool,
    },
    /// Set the favorite flag on several media items
    FavoriteMany {
        #[arg(required = true)]
        ids: Vec<Uuid>,
        #[arg(long)]
        unset: bool,
    },
    /// Delete media items
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Download one media item to a file
    Download {
        id: Uuid,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print download links for every item of a trip
    DownloadLinks {
        #[arg(long)]
        trip: Uuid,
    },
    /// Replace the photo of an itinerary activity
    ActivityPhoto { activity_id: Uuid, file: PathBuf },
}

#[derive(Subcommand)]
enum TripCommand {
    /// List the trips you created or joined
    List,
    /// Create a trip
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Join a trip with its six character code
    Join { code: String },
    /// Show one trip
    Show { id: Uuid },
    /// Delete a trip you created
    Delete { id: Uuid },
}

#[derive(Serialize)]
struct FailedUpload {
    filename: String,
    #[serde(flatten)]
    error: ErrorReport,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn fail(err: AppError) -> anyhow::Result<()> {
    log_error(&err);
    print_json(&ErrorReport::from(&err))?;
    Err(err.into())
}

fn list_scope(trip: Option<Uuid>, unsorted: bool, favorites: bool) -> GalleryScope {
    match (trip, unsorted, favorites) {
        (Some(id), _, _) => GalleryScope::Collection(id),
        (None, _, true) => GalleryScope::Favorites,
        _ => GalleryScope::Unsorted,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Invalid CENTRIQ_* configuration")?;
    let mut session = Session::restore(&config.session_file).context("Failed to restore session")?;
    let client = ApiClient::from_session(&config, &session)
        .context("Failed to create API client. Check CENTRIQ_API_URL (or API_URL)")?;
    let service: Arc<dyn MediaService> = Arc::new(client.clone());
    let trip_service: Arc<dyn CollectionService> = Arc::new(client.clone());

    match cli.command {
        Commands::Login { email, password } => {
            let session = client.login(&email, &password).await?;
            session.persist(&config.session_file)?;
            print_json(&serde_json::json!({ "logged_in": true, "user": session.user() }))?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let session = client.register(&name, &email, &password).await?;
            session.persist(&config.session_file)?;
            print_json(&serde_json::json!({ "registered": true, "user": session.user() }))?;
        }
        Commands::Logout => {
            session.logout(&config.session_file)?;
            print_json(&serde_json::json!({ "logged_out": true }))?;
        }
        Commands::Profile { name, picture_url } => {
            let update = ProfileUpdate {
                name,
                profile_pic_url: picture_url,
            };
            let user = match client.update_profile(&mut session, &update).await {
                Ok(user) => user,
                Err(e) => return fail(AppError::from_service(e)),
            };
            session.persist(&config.session_file)?;
            print_json(&serde_json::json!({ "updated": true, "user": user }))?;
        }
        Commands::DeleteAccount { yes } => {
            if !yes {
                return fail(AppError::InvalidInput(
                    "Deleting the account cannot be undone; pass --yes to confirm".to_string(),
                ));
            }
            if let Err(e) = client
                .delete_account(&mut session, &config.session_file)
                .await
            {
                return fail(AppError::from_service(e));
            }
            print_json(&serde_json::json!({ "account_deleted": true }))?;
        }
        Commands::Trips { action } => {
            let trips = Collections::new(trip_service);
            let result = match action {
                TripCommand::List => trips
                    .list()
                    .await
                    .and_then(|list| Ok(serde_json::to_value(list)?)),
                TripCommand::Create { name, description } => trips
                    .create(&name, description)
                    .await
                    .and_then(|trip| Ok(serde_json::to_value(trip)?)),
                TripCommand::Join { code } => trips
                    .join(&code)
                    .await
                    .and_then(|trip| Ok(serde_json::to_value(trip)?)),
                TripCommand::Show { id } => trips
                    .details(id)
                    .await
                    .and_then(|trip| Ok(serde_json::to_value(trip)?)),
                TripCommand::Delete { id } => {
                    let gallery = Gallery::new(service, config.default_page_size);
                    trips
                        .delete(id, &gallery)
                        .await
                        .map(|()| serde_json::json!({ "deleted": id }))
                }
            };
            match result {
                Ok(value) => print_json(&value)?,
                Err(e) => return fail(e),
            }
        }
        Commands::Whoami { refresh } => {
            if refresh && session.token().is_some() {
                let user = client.me().await?;
                session.set_user(user);
                session.persist(&config.session_file)?;
            }
            print_json(&serde_json::json!({
                "authenticated": session.token().is_some(),
                "user": session.user(),
            }))?;
        }
        Commands::Upload { files, trip } => {
            let sources = files
                .iter()
                .map(|path| SourceFile::from_path(path))
                .collect::<Result<Vec<_>, _>>()?;

            let pipeline = UploadPipeline::new(service.clone(), config.upload.clone());
            let mut events = pipeline.subscribe();
            let progress_log = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match event {
                        UploadEvent::Progress { id, percent } => {
                            tracing::info!(upload_id = %id, percent, "Uploading")
                        }
                        UploadEvent::ConversionFallback { id, reason } => {
                            tracing::warn!(upload_id = %id, reason = %reason, "Uploading original file")
                        }
                        other => tracing::debug!(event = ?other, "Upload event"),
                    }
                }
            });

            let report = pipeline.enqueue(sources, trip)?;
            for issue in &report.issues {
                log_error(issue);
            }

            let outcome = match pipeline.start(&session).await {
                Ok(outcome) => outcome,
                Err(e) => return fail(e),
            };

            let gallery = Gallery::new(service, config.default_page_size);
            let merged = gallery.merge_uploaded(outcome.records.clone());
            pipeline.clear_finished();
            drop(pipeline);
            progress_log.await.ok();

            let failed: Vec<FailedUpload> = outcome
                .failures
                .iter()
                .map(|failure| FailedUpload {
                    filename: failure.filename.clone(),
                    error: ErrorReport::from(&failure.error),
                })
                .collect();
            let skipped: Vec<ErrorReport> = report.issues.iter().map(ErrorReport::from).collect();

            print_json(&serde_json::json!({
                "accepted": report.accepted.len(),
                "skipped": skipped,
                "uploaded": outcome.records,
                "failed": failed,
                "merged": merged,
            }))?;
        }
        Commands::List {
            trip,
            unsorted,
            favorites,
            page,
            page_size,
        } => {
            let scope = list_scope(trip, unsorted, favorites);
            let gallery = Gallery::new(service, config.default_page_size);
            let outcome = match gallery.load_page(scope, page, page_size).await {
                Ok(outcome) => outcome,
                Err(e) => return fail(e),
            };
            print_json(&serde_json::json!({
                "scope": scope,
                "page": page,
                "result": outcome,
                "items": gallery.collection_items(scope),
            }))?;
        }
        Commands::Favorite { id, unset } => {
            let record = service
                .set_favorite(id, !unset)
                .await
                .map_err(AppError::from_service);
            match record {
                Ok(record) => print_json(&record)?,
                Err(e) => return fail(e),
            }
        }
        Commands::FavoriteMany { ids, unset } => {
            let gallery = Gallery::new(service, config.default_page_size);
            match gallery.bulk_toggle_favorite(&ids, !unset).await {
                Ok(confirmed) => print_json(&serde_json::json!({ "updated": confirmed }))?,
                Err(e) => return fail(e),
            }
        }
        Commands::Delete { ids } => {
            let gallery = Gallery::new(service, config.default_page_size);
            let report = gallery.delete_many(&ids).await;
            print_json(&report)?;
            if !report.failed.is_empty() {
                anyhow::bail!("{} of {} deletions failed", report.failed.len(), ids.len());
            }
        }
        Commands::Download { id, out } => {
            let gallery = Gallery::new(service, config.default_page_size);
            let bytes = match gallery.download(id).await {
                Ok(bytes) => bytes,
                Err(e) => return fail(e),
            };
            std::fs::write(&out, &bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            print_json(&serde_json::json!({
                "id": id,
                "path": out.display().to_string(),
                "size_bytes": bytes.len(),
            }))?;
        }
        Commands::DownloadLinks { trip } => {
            let gallery = Gallery::new(service, config.default_page_size);
            match gallery.download_links(trip).await {
                Ok(links) => print_json(&links)?,
                Err(e) => return fail(e),
            }
        }
        Commands::ActivityPhoto { activity_id, file } => {
            let source = SourceFile::from_path(&file)?;
            let uploader = ActivityPhotoUploader::new(service, config.upload.jpeg_quality);
            match uploader.upload(activity_id, source).await {
                Ok(photo) => print_json(&photo)?,
                Err(e) => return fail(e),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_scope_prefers_trip() {
        let trip = Uuid::new_v4();
        assert_eq!(
            list_scope(Some(trip), false, false),
            GalleryScope::Collection(trip)
        );
        assert_eq!(list_scope(None, false, true), GalleryScope::Favorites);
        assert_eq!(list_scope(None, true, false), GalleryScope::Unsorted);
        assert_eq!(list_scope(None, false, false), GalleryScope::Unsorted);
    }

    #[test]
    fn cli_parses_upload_with_trip() {
        let trip = Uuid::new_v4();
        let trip_arg = trip.to_string();
        let cli = Cli::try_parse_from([
            "centriq",
            "upload",
            "a.jpg",
            "b.heic",
            "--trip",
            trip_arg.as_str(),
        ])
        .unwrap();
        match cli.command {
            Commands::Upload { files, trip: parsed } => {
                assert_eq!(files.len(), 2);
                assert_eq!(parsed, Some(trip));
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn cli_parses_trip_commands() {
        let cli = Cli::try_parse_from(["centriq", "trips", "join", "ab12cd"]).unwrap();
        match cli.command {
            Commands::Trips {
                action: TripCommand::Join { code },
            } => assert_eq!(code, "ab12cd"),
            _ => panic!("expected trips join"),
        }

        let cli = Cli::try_parse_from([
            "centriq",
            "trips",
            "create",
            "Lisbon",
            "--description",
            "Spring break",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Trips {
                action: TripCommand::Create { ref name, description: Some(_) }
            } if name == "Lisbon"
        ));
    }

    #[test]
    fn cli_parses_account_commands() {
        let cli = Cli::try_parse_from(["centriq", "profile", "--name", "Maya R"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Profile { name: Some(ref n), picture_url: None } if n == "Maya R"
        ));

        let cli = Cli::try_parse_from(["centriq", "delete-account"]).unwrap();
        assert!(matches!(cli.command, Commands::DeleteAccount { yes: false }));
    }

    #[test]
    fn cli_rejects_conflicting_list_scopes() {
        assert!(Cli::try_parse_from(["centriq", "list", "--unsorted", "--favorites"]).is_err());
    }
}
