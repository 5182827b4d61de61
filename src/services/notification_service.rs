// src/services/notification_service.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::NotificationRepository,
    models::{
        auth::User,
        notification::{Notification, NotificationFilter, NotificationKind, OutgoingNotification},
        project::Project,
    },
};

// =============================================================================
//  CANAIS DE ENTREGA
// =============================================================================

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, message: &OutgoingNotification) -> Result<(), AppError>;
}

// Grava o registro que aparece no sino do usuário
pub struct InAppSink {
    repo: NotificationRepository,
}

impl InAppSink {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationSink for InAppSink {
    fn name(&self) -> &'static str {
        "in_app"
    }

    async fn deliver(&self, message: &OutgoingNotification) -> Result<(), AppError> {
        self.repo.insert(message).await?;
        Ok(())
    }
}

/// E-mail: só registra a mensagem no log, sem servidor SMTP.
pub struct MailLogSink;

#[async_trait]
impl NotificationSink for MailLogSink {
    fn name(&self) -> &'static str {
        "mail"
    }

    async fn deliver(&self, message: &OutgoingNotification) -> Result<(), AppError> {
        tracing::info!(
            target: "mail",
            to = %message.recipient_email,
            subject = %message.title,
            "📧 {}",
            message.body
        );
        Ok(())
    }
}

// =============================================================================
//  FILA + WORKER
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Espera antes da próxima tentativa: base * 2^(tentativa - 1), com teto.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<OutgoingNotification>,
}

impl NotificationDispatcher {
    /// Cria a fila limitada e sobe o worker que entrega em cada canal.
    pub fn spawn(sinks: Vec<Arc<dyn NotificationSink>>, policy: RetryPolicy, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<OutgoingNotification>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                for sink in &sinks {
                    deliver_with_retry(sink.as_ref(), &message, policy).await;
                }
            }
            tracing::info!("📭 Fila de notificações encerrada");
        });

        Self { sender }
    }

    #[cfg(test)]
    pub fn from_sender(sender: mpsc::Sender<OutgoingNotification>) -> Self {
        Self { sender }
    }

    /// Enfileira sem bloquear. Fila cheia ou fechada só gera log.
    pub fn dispatch(&self, message: OutgoingNotification) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(
                    "⚠️ Fila de notificações cheia, descartando {:?} para {}",
                    message.kind,
                    message.recipient_email
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                tracing::error!(
                    "🔥 Fila de notificações fechada, descartando {:?} para {}",
                    message.kind,
                    message.recipient_email
                );
                false
            }
        }
    }
}

/// Tenta entregar até `max_attempts` vezes. Devolve se conseguiu.
pub async fn deliver_with_retry(
    sink: &dyn NotificationSink,
    message: &OutgoingNotification,
    policy: RetryPolicy,
) -> bool {
    for attempt in 1..=policy.max_attempts {
        match sink.deliver(message).await {
            Ok(()) => return true,
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    "⚠️ Canal '{}' falhou (tentativa {}/{}): {}. Nova tentativa em {:?}",
                    sink.name(),
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    "🔥 Canal '{}' desistiu de {:?} para {} após {} tentativas: {}",
                    sink.name(),
                    message.kind,
                    message.recipient_email,
                    policy.max_attempts,
                    e
                );
            }
        }
    }
    false
}

// =============================================================================
//  MENSAGENS DO FLUXO DE PROJETOS
// =============================================================================

pub fn project_notification(kind: NotificationKind, project: &Project, recipient: &User, actor_name: &str) -> OutgoingNotification {
    let (title, body) = match kind {
        NotificationKind::ProjectSubmitted => (
            format!("Projeto aguardando aprovação: {}", project.title),
            format!("{} enviou o projeto \"{}\" para aprovação.", actor_name, project.title),
        ),
        NotificationKind::ProjectApproved => (
            format!("Projeto aprovado: {}", project.title),
            format!("{} aprovou o projeto \"{}\".", actor_name, project.title),
        ),
        NotificationKind::ProjectRejected => {
            let reason = project
                .rejection_reason
                .as_deref()
                .map(|r| format!(" Motivo: {}", r))
                .unwrap_or_default();
            (
                format!("Projeto rejeitado: {}", project.title),
                format!("{} rejeitou o projeto \"{}\".{}", actor_name, project.title, reason),
            )
        }
    };

    OutgoingNotification {
        recipient_id: recipient.id,
        recipient_email: recipient.email.clone(),
        kind,
        title,
        body,
        data: json!({ "projectId": project.id, "status": project.status.as_str() }),
    }
}

// =============================================================================
//  CONSULTA (SINO)
// =============================================================================

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        self.repo.list_for_user(user_id, filter, page).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.repo.unread_count(user_id).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification, AppError> {
        self.repo
            .mark_read(id, user_id)
            .await?
            .ok_or(AppError::NotFound("notification"))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn message() -> OutgoingNotification {
        OutgoingNotification {
            recipient_id: Uuid::new_v4(),
            recipient_email: "gerente@provedor.net".into(),
            kind: NotificationKind::ProjectSubmitted,
            title: "Projeto aguardando aprovação".into(),
            body: "corpo".into(),
            data: json!({}),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    struct RecordingSink(mpsc::UnboundedSender<OutgoingNotification>);

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }
        async fn deliver(&self, message: &OutgoingNotification) -> Result<(), AppError> {
            let _ = self.0.send(message.clone());
            Ok(())
        }
    }

    // Falha nas primeiras `failures` chamadas
    struct FlakySink {
        calls: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        fn name(&self) -> &'static str {
            "flaky"
        }
        async fn deliver(&self, _message: &OutgoingNotification) -> Result<(), AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(AppError::InternalServerError(anyhow::anyhow!("smtp fora do ar")));
            }
            Ok(())
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(20), Duration::from_secs(30));
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let sink = FlakySink { calls: AtomicU32::new(0), failures: 2 };
        assert!(deliver_with_retry(&sink, &message(), fast_policy(3)).await);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sink = FlakySink { calls: AtomicU32::new(0), failures: 10 };
        assert!(!deliver_with_retry(&sink, &message(), fast_policy(3)).await);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn worker_delivers_to_every_sink() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![
            Arc::new(FlakySink { calls: AtomicU32::new(0), failures: 1 }),
            Arc::new(RecordingSink(tx_a)),
            Arc::new(RecordingSink(tx_b)),
        ];
        let dispatcher = NotificationDispatcher::spawn(sinks, fast_policy(3), 8);

        let msg = message();
        assert!(dispatcher.dispatch(msg.clone()));

        assert_eq!(rx_a.recv().await.unwrap(), msg);
        assert_eq!(rx_b.recv().await.unwrap(), msg);
    }

    #[tokio::test]
    async fn dispatch_never_blocks_when_queue_is_full_or_closed() {
        let (tx, rx) = mpsc::channel(1);
        let dispatcher = NotificationDispatcher::from_sender(tx);

        assert!(dispatcher.dispatch(message()));
        assert!(!dispatcher.dispatch(message())); // cheia

        drop(rx);
        assert!(!dispatcher.dispatch(message())); // fechada
    }
}
