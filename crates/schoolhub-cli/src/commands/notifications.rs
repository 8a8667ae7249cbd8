//! The `schoolhub notifications` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use comfy_table::Cell;
use schoolhub_core::events::{NotificationTopics, UnreadCount};
use schoolhub_core::live::LiveNotifications;
use schoolhub_core::model::{Notification, NotificationType, Priority, TargetAudience};
use schoolhub_core::poller::UnreadPoller;
use schoolhub_core::requests::{AttachmentUpload, NotificationDraft, NotificationQuery};
use schoolhub_core::scope::ViewScope;
use schoolhub_core::traits::NotificationApi;
use schoolhub_core::validation::{
    ensure_valid, validate_attachment_sizes, validate_notification, FormMode,
};
use tokio::sync::broadcast::error::RecvError;

use super::{connect, prefs, table};

#[derive(Subcommand)]
pub enum NotificationAction {
    /// List notifications
    List {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Filter by type: general, class, exam, schedule, announcement
        #[arg(long)]
        kind: Option<NotificationType>,

        /// Filter by priority: low, medium, high, urgent
        #[arg(long)]
        priority: Option<Priority>,

        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Show one notification and its attachments
    Show { id: String },

    /// Mark notifications as read
    Read {
        /// Notification ids
        ids: Vec<String>,

        /// Mark every notification as read
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },

    /// Delete a notification
    Delete { id: String },

    /// Save an attachment to disk
    Download {
        /// Notification id
        id: String,

        /// Attachment id
        #[arg(long)]
        attachment: String,

        /// Output path (default: the attachment's name)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Publish a notification
    Send {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,

        #[arg(long, default_value = "general")]
        kind: NotificationType,

        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// all, students, teachers or specific_class
        #[arg(long, default_value = "all")]
        audience: TargetAudience,

        /// Target class for specific_class
        #[arg(long)]
        class: Option<String>,

        /// Publish date (RFC 3339)
        #[arg(long)]
        publish: Option<DateTime<Utc>>,

        /// Expiry date (RFC 3339)
        #[arg(long)]
        expires: Option<DateTime<Utc>>,

        /// File to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Full-text search
    Search { text: String },

    /// Follow the unread count
    Watch {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

pub async fn execute(config_path: Option<&Path>, action: NotificationAction) -> Result<()> {
    let (config, client) = connect(config_path)?;
    let client = Arc::new(client);
    let live = LiveNotifications::new(client.clone(), NotificationTopics::shared());
    match action {
        NotificationAction::List {
            page,
            kind,
            priority,
            unread,
        } => {
            if !prefs::load().sidebar_collapsed {
                match client.unread_count().await {
                    Ok(count) => println!("Unread: {count}"),
                    Err(e) => tracing::warn!("unread count unavailable: {e}"),
                }
            }
            let query = NotificationQuery {
                page,
                limit: Some(config.page_size),
                kind,
                priority,
                unread_only: unread,
            };
            let listed = client
                .list_notifications(&query)
                .await
                .context("failed to list notifications")?;
            print_list(&listed.items);
            if listed.pagination.has_next() {
                println!(
                    "Page {} of {}. Use --page {} for more.",
                    listed.pagination.page,
                    listed.pagination.pages,
                    listed.pagination.page + 1
                );
            }
        }

        NotificationAction::Show { id } => {
            let notification = client
                .get_notification(&id)
                .await
                .with_context(|| format!("failed to load notification {id}"))?;
            println!(
                "{} [{} / {}]",
                notification.title, notification.kind, notification.priority
            );
            if notification.is_expired(Utc::now()) {
                println!("(expired)");
            }
            println!("\n{}", notification.content);
            if !notification.attachments.is_empty() {
                let mut files = table(vec!["Attachment", "Name", "Type", "Size"]);
                for attachment in &notification.attachments {
                    files.add_row(vec![
                        Cell::new(&attachment.id),
                        Cell::new(attachment.display_name()),
                        Cell::new(&attachment.mime_type),
                        Cell::new(format!("{} KB", attachment.size.div_ceil(1024))),
                    ]);
                }
                println!("\n{files}");
            }
        }

        NotificationAction::Read { ids, all } => {
            let mut unread = live.topics().unread.subscribe();
            if all {
                live.mark_all_read().await.context("failed to mark all as read")?;
                println!("All notifications marked as read.");
            } else {
                match ids.as_slice() {
                    [] => bail!("give notification ids or --all"),
                    [id] => live.mark_read(id).await?,
                    many => live.mark_many_read(many).await?,
                }
                println!("Marked {} notification(s) as read.", ids.len());
            }
            if let Ok(UnreadCount(count)) = unread.try_recv() {
                println!("Unread: {count}");
            }
        }

        NotificationAction::Delete { id } => {
            live.delete(&id)
                .await
                .with_context(|| format!("failed to delete notification {id}"))?;
            println!("Deleted {id}");
        }

        NotificationAction::Download {
            id,
            attachment,
            output,
        } => {
            let output = match output {
                Some(path) => path,
                None => {
                    let notification = client.get_notification(&id).await?;
                    let found = notification
                        .attachment(&attachment)
                        .with_context(|| format!("notification {id} has no attachment {attachment}"))?;
                    PathBuf::from(found.display_name())
                }
            };
            let bytes = client
                .download_attachment(&id, &attachment)
                .await
                .context("failed to download attachment")?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), output.display());
        }

        NotificationAction::Search { text } => {
            let found = client
                .search_notifications(&text, &NotificationQuery::default())
                .await
                .context("search failed")?;
            print_list(&found.items);
        }

        NotificationAction::Watch { seconds } => {
            watch(&live, client, config.poll_interval(), seconds.map(Duration::from_secs)).await?;
        }

        NotificationAction::Send {
            title,
            content,
            kind,
            priority,
            audience,
            class,
            publish,
            expires,
            attachments,
        } => {
            let draft = NotificationDraft {
                kind,
                priority,
                target_audience: audience,
                target_class: class,
                publish_date: publish,
                expiry_date: expires,
                ..NotificationDraft::new(title, content)
            };
            let uploads = read_uploads(&attachments)?;
            ensure_valid(validate_notification(
                &draft,
                &uploads,
                FormMode::Create,
                Utc::now(),
            ))?;

            let created = live
                .create(&draft, &uploads)
                .await
                .context("failed to publish notification")?;
            println!(
                "Published {} ({} attachment(s))",
                created.id,
                created.attachments.len()
            );
        }
    }
    Ok(())
}

fn print_list(notifications: &[Notification]) {
    if notifications.is_empty() {
        println!("No notifications.");
        return;
    }
    let mut list = table(vec!["Id", "Title", "Type", "Priority", "Files", "Published"]);
    for n in notifications {
        list.add_row(vec![
            Cell::new(&n.id),
            Cell::new(&n.title),
            Cell::new(n.kind),
            Cell::new(n.priority),
            Cell::new(n.attachments.len()),
            Cell::new(
                n.publish_date
                    .or(n.created_at)
                    .map_or("-".to_string(), |t| t.format("%Y-%m-%d").to_string()),
            ),
        ]);
    }
    println!("\n{list}");
}

/// Poll the unread count until Ctrl-C or `limit` elapses.
async fn watch(
    live: &LiveNotifications,
    api: Arc<dyn NotificationApi>,
    interval: Duration,
    limit: Option<Duration>,
) -> Result<()> {
    let topics = Arc::clone(live.topics());
    let mut unread = topics.unread.subscribe();
    let scope = ViewScope::new("notifications-watch");
    let _poller = UnreadPoller::spawn(api, topics, interval, scope.handle());

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = unread.recv() => match event {
                Ok(UnreadCount(count)) => println!("Unread: {count}"),
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "unread updates lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    scope.close();
    Ok(())
}

/// Check the count and size limits from file metadata, then read the files.
fn read_uploads(paths: &[PathBuf]) -> Result<Vec<AttachmentUpload>> {
    let mut sizes = Vec::with_capacity(paths.len());
    for path in paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        sizes.push((upload_name(path)?, metadata.len()));
    }
    let named: Vec<(&str, u64)> = sizes.iter().map(|(name, size)| (name.as_str(), *size)).collect();
    ensure_valid(validate_attachment_sizes(&named))?;
    paths.iter().map(|path| read_upload(path)).collect()
}

fn upload_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("not a file: {}", path.display()))
}

fn read_upload(path: &Path) -> Result<AttachmentUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = upload_name(path)?;
    Ok(AttachmentUpload {
        mime_type: mime_for(&filename).to_string(),
        filename,
        bytes,
    })
}

fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
