use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::push::PushGateway;
use crate::services::notifications::NotificationService;

/// Workflow facts emitted by the services layer. The processing loop turns
/// them into persisted notifications and push deliveries; no operation ever
/// blocks on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequestSubmitted {
        request_id: Uuid,
        folio: String,
        area: String,
    },
    RequestAuthorized {
        request_id: Uuid,
        folio: String,
        requester_id: Uuid,
        authorized_by: Uuid,
    },
    RequestRejected {
        request_id: Uuid,
        folio: String,
        requester_id: Uuid,
        reason: String,
    },
    RequestCancelled {
        request_id: Uuid,
        folio: String,
        requester_id: Uuid,
    },
    QuotationAttached {
        request_id: Uuid,
        quotation_id: Uuid,
        supplier_id: Uuid,
    },
    QuotationItemSelected {
        request_item_id: Uuid,
        quotation_item_id: Uuid,
    },
    OrderIssued {
        order_id: Uuid,
        folio: String,
        request_id: Uuid,
        requester_id: Uuid,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        request_id: Uuid,
        requester_id: Uuid,
        old_status: String,
        new_status: String,
    },
    BudgetExceeded {
        request_id: Uuid,
        folio: String,
        area: String,
        year: i32,
        overrun: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. A full or closed channel is reported to
    /// the caller but should never fail a workflow transition.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes workflow events and fans them out as notifications.
pub async fn process_events(
    mut rx: mpsc::Receiver<Event>,
    notifications: Arc<NotificationService>,
    push: Arc<PushGateway>,
) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        if let Err(e) = handle_event(&event, &notifications, &push).await {
            error!(?event, error = %e, "Failed to process workflow event");
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

async fn handle_event(
    event: &Event,
    notifications: &NotificationService,
    push: &PushGateway,
) -> Result<(), crate::errors::ServiceError> {
    let created = match event {
        Event::RequestSubmitted { folio, area, .. } => {
            notifications
                .notify_role(
                    "director",
                    "solicitud_pendiente",
                    "Nueva solicitud pendiente",
                    &format!("La solicitud {} del área {} espera autorización", folio, area),
                    Some(&format!("/requests?folio={}", folio)),
                )
                .await?
        }
        Event::RequestAuthorized {
            folio, requester_id, ..
        } => {
            let mut created = notifications
                .notify_user(
                    *requester_id,
                    "solicitud_autorizada",
                    "Solicitud autorizada",
                    &format!("Tu solicitud {} fue autorizada", folio),
                    Some(&format!("/requests?folio={}", folio)),
                )
                .await?;
            created.extend(
                notifications
                    .notify_role(
                        "comprador",
                        "solicitud_por_cotizar",
                        "Solicitud lista para cotizar",
                        &format!("La solicitud {} está autorizada y lista para cotizar", folio),
                        Some(&format!("/requests?folio={}", folio)),
                    )
                    .await?,
            );
            created
        }
        Event::RequestRejected {
            folio,
            requester_id,
            reason,
            ..
        } => {
            notifications
                .notify_user(
                    *requester_id,
                    "solicitud_rechazada",
                    "Solicitud rechazada",
                    &format!("Tu solicitud {} fue rechazada: {}", folio, reason),
                    Some(&format!("/requests?folio={}", folio)),
                )
                .await?
        }
        Event::RequestCancelled {
            folio, requester_id, ..
        } => {
            notifications
                .notify_user(
                    *requester_id,
                    "solicitud_cancelada",
                    "Solicitud cancelada",
                    &format!("La solicitud {} fue cancelada", folio),
                    None,
                )
                .await?
        }
        Event::QuotationAttached { request_id, .. } => {
            info!(request_id = %request_id, "quotation attached");
            Vec::new()
        }
        Event::QuotationItemSelected { .. } => Vec::new(),
        Event::OrderIssued {
            folio,
            requester_id,
            total_amount,
            ..
        } => {
            notifications
                .notify_user(
                    *requester_id,
                    "orden_emitida",
                    "Orden de compra emitida",
                    &format!(
                        "Se emitió la orden {} por un total de {}",
                        folio, total_amount
                    ),
                    Some(&format!("/orders?folio={}", folio)),
                )
                .await?
        }
        Event::OrderStatusChanged {
            requester_id,
            old_status,
            new_status,
            ..
        } => {
            notifications
                .notify_user(
                    *requester_id,
                    "orden_actualizada",
                    "Orden de compra actualizada",
                    &format!("Tu orden pasó de '{}' a '{}'", old_status, new_status),
                    None,
                )
                .await?
        }
        Event::BudgetExceeded {
            folio,
            area,
            year,
            overrun,
            ..
        } => {
            notifications
                .notify_role(
                    "director",
                    "presupuesto_excedido",
                    "Presupuesto excedido",
                    &format!(
                        "La solicitud {} excede el presupuesto de {} {} por {}",
                        folio, area, year, overrun
                    ),
                    Some(&format!("/requests?folio={}", folio)),
                )
                .await?
        }
    };

    for notification in created {
        if let Err(e) = push.publish(&notification) {
            // Polling is the compensating delivery path.
            warn!(notification_id = %notification.id, error = %e, "push delivery skipped");
        }
    }

    Ok(())
}
