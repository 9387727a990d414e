//! Per-event notification policies
//!
//! [`dispatch`] maps each lifecycle event onto its recipient, URL and
//! subject policy, builds exactly one notification and sends it. Kind
//! dispatch is a plain `match`; the shared formatting lives in
//! [`crate::notification`].

use crate::event::{ComputerSnapshot, JobSnapshot, LifecycleEvent, RunSnapshot, UserRef};
use crate::mailer::Mailer;
use crate::notification::{Notification, NotificationBuilder};

/// Handle one lifecycle event
///
/// Returns the notification that was built (with `should_notify() == false`
/// when the resource has no recipients configured), or `None` when the
/// event does not concern a watched resource and no notification was built
/// at all.
pub async fn dispatch(mailer: &Mailer, event: &LifecycleEvent) -> Option<Notification> {
    match event {
        LifecycleEvent::JobRenamed {
            item,
            old_name,
            initiator,
            ..
        } => {
            let job = item.as_job()?;
            let fragment = format!("renamed from {old_name}");
            Some(notify_job(mailer, job, &fragment, initiator.clone()).await)
        }
        LifecycleEvent::JobUpdated { item, initiator } => {
            let job = item.as_job()?;
            Some(notify_job(mailer, job, "updated", initiator.clone()).await)
        }
        LifecycleEvent::JobDeleted { item, initiator } => {
            let job = item.as_job()?;
            Some(notify_job(mailer, job, "deleted", initiator.clone()).await)
        }
        LifecycleEvent::ComputerOnline { computer, initiator } => Some(
            notify_computer(
                mailer,
                computer,
                true,
                "marked online",
                String::new(),
                initiator.clone(),
            )
            .await,
        ),
        LifecycleEvent::ComputerOffline {
            computer,
            cause,
            initiator,
        } => {
            let body = cause
                .as_ref()
                .map(|cause| cause.description.clone())
                .unwrap_or_default();
            Some(
                notify_computer(mailer, computer, false, "marked offline", body, initiator.clone())
                    .await,
            )
        }
        LifecycleEvent::ComputerTemporarilyOffline {
            computer,
            cause,
            initiator,
        } => {
            let body = cause
                .as_ref()
                .map(|cause| cause.description.clone())
                .unwrap_or_default();
            Some(
                notify_computer(
                    mailer,
                    computer,
                    false,
                    "marked temporarily offline",
                    body,
                    initiator.clone(),
                )
                .await,
            )
        }
        LifecycleEvent::ComputerTemporarilyOnline { computer, initiator } => Some(
            notify_computer(
                mailer,
                computer,
                true,
                "marked online (was temporarily offline)",
                String::new(),
                initiator.clone(),
            )
            .await,
        ),
        LifecycleEvent::RunFinalized { run, .. } => on_run_finalized(mailer, run).await,
    }
}

/// Job renamed/updated/deleted policy
///
/// Recipients come from the job's watcher address property. A job without
/// one still produces a notification, just one that nobody receives, so the
/// suppressed outcome stays observable.
async fn notify_job(
    mailer: &Mailer,
    job: &JobSnapshot,
    event_fragment: &str,
    initiator: Option<UserRef>,
) -> Notification {
    let mut builder = NotificationBuilder::new(mailer.instance_root_url())
        .subject(format!("Job {} {}", job.name, event_fragment))
        .url(job.full_url())
        .name(job.name.clone())
        .initiator(initiator.unwrap_or_else(UserRef::unknown));

    if let Some(addresses) = &job.watcher_addresses {
        builder = builder.recipients(addresses.clone());
        if let Some(diff_url) = mailer.config_history().last_change_diff_url(job) {
            builder = builder.pair("Change", mailer.absolute_url(&diff_url));
        }
    }

    let notification = builder.build();
    notification.send(mailer).await;
    notification
}

/// Computer online/offline policy
///
/// The node property keeps independent address lists per direction; an
/// online-direction event must never fall back to the offline list.
async fn notify_computer(
    mailer: &Mailer,
    computer: &ComputerSnapshot,
    online: bool,
    event_fragment: &str,
    body: String,
    initiator: Option<UserRef>,
) -> Notification {
    let mut builder = NotificationBuilder::new(mailer.instance_root_url())
        .subject(format!("Computer {} {}", computer.display_name, event_fragment))
        .body(body)
        .url(computer.url.clone())
        .name(computer.display_name.clone())
        .initiator(initiator.unwrap_or_else(UserRef::unknown));

    if let Some(property) = &computer.property {
        let recipients = if online {
            &property.online_addresses
        } else {
            &property.offline_addresses
        };
        builder = builder.recipients(recipients.clone());
    }

    let notification = builder.build();
    notification.send(mailer).await;
    notification
}

/// Availability policy: tell the user who took a computer offline that it is
/// no longer occupied
///
/// Fires only when the computer is temporarily offline because of that user
/// and every executor slot is idle, apart from the one that just finished
/// the finalized run.
async fn on_run_finalized(mailer: &Mailer, run: &RunSnapshot) -> Option<Notification> {
    let Some(computer) = &run.computer else {
        tracing::info!("Unable to identify the computer of {}", run.display_name);
        return None;
    };

    if !computer.temporarily_offline {
        return None;
    }

    let user = computer.offline_cause.as_ref()?.user.as_ref()?;

    if !is_idle_except(computer, &run.id) {
        return None;
    }

    let Some(address) = &user.mail_address else {
        tracing::debug!(
            "User {} has no mail address configured, not notifying",
            user.id
        );
        return None;
    };

    let subject = format!(
        "Computer '{}' you have put offline is no longer occupied",
        computer.display_name
    );

    let notification = NotificationBuilder::new(mailer.instance_root_url())
        .subject(subject)
        .url(computer.url.clone())
        .recipients(address.clone())
        .initiator(user.clone())
        .build();
    notification.send(mailer).await;
    Some(notification)
}

/// True when every executor slot, regular or one-off, is idle or busy with
/// the given run
fn is_idle_except(computer: &ComputerSnapshot, run_id: &str) -> bool {
    computer
        .executors
        .iter()
        .chain(computer.one_off_executors.iter())
        .all(|executor| executor.idle || executor.run_id.as_deref() == Some(run_id))
}
