use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::errors::ServiceError;

/// Lifecycle status of a purchase request. The serialized strings are part of
/// the wire contract with the frontend and of the database CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Borrador,
    Programada,
    Pendiente,
    Autorizada,
    Cotizando,
    Emitida,
    EnTransito,
    Recibida,
    Rechazada,
    Cancelada,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Recibida | Self::Rechazada | Self::Cancelada)
    }

    /// Whether a transition between two statuses is allowed. Same-status
    /// transitions are permitted as no-ops.
    pub fn can_transition_to(self, to: Self) -> bool {
        use RequestStatus::*;
        match (self, to) {
            (Borrador, Pendiente) => true,
            (Borrador, Programada) => true,
            (Borrador, Cancelada) => true,

            (Programada, Pendiente) => true,
            (Programada, Cancelada) => true,

            (Pendiente, Autorizada) => true,
            (Pendiente, Rechazada) => true,
            (Pendiente, Cancelada) => true,

            (Autorizada, Cotizando) => true,

            (Cotizando, Emitida) => true,

            // Mirrors of the purchase order lifecycle.
            (Emitida, EnTransito) => true,
            (Emitida, Cancelada) => true,
            (EnTransito, Recibida) => true,
            (EnTransito, Cancelada) => true,

            _ if self == to => true,

            _ => false,
        }
    }

    pub fn all_values() -> Vec<&'static str> {
        Self::iter()
            .map(|s| match s {
                Self::Borrador => "borrador",
                Self::Programada => "programada",
                Self::Pendiente => "pendiente",
                Self::Autorizada => "autorizada",
                Self::Cotizando => "cotizando",
                Self::Emitida => "emitida",
                Self::EnTransito => "en_transito",
                Self::Recibida => "recibida",
                Self::Rechazada => "rechazada",
                Self::Cancelada => "cancelada",
            })
            .collect()
    }
}

/// Status of a purchase order, a strict suffix of the request lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Emitida,
    EnTransito,
    Recibida,
    Cancelada,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Recibida | Self::Cancelada)
    }

    pub fn can_transition_to(self, to: Self) -> bool {
        use OrderStatus::*;
        match (self, to) {
            (Emitida, EnTransito) => true,
            (EnTransito, Recibida) => true,
            (Emitida, Cancelada) => true,
            (EnTransito, Cancelada) => true,
            _ if self == to => true,
            _ => false,
        }
    }

    /// The request status an order status maps onto.
    pub fn as_request_status(self) -> RequestStatus {
        match self {
            Self::Emitida => RequestStatus::Emitida,
            Self::EnTransito => RequestStatus::EnTransito,
            Self::Recibida => RequestStatus::Recibida,
            Self::Cancelada => RequestStatus::Cancelada,
        }
    }
}

/// Parse a stored status column, failing with InternalError on values that
/// the CHECK constraint should have rejected.
pub fn parse_request_status(raw: &str) -> Result<RequestStatus, ServiceError> {
    RequestStatus::from_str(raw)
        .map_err(|_| ServiceError::InternalError(format!("unknown request status '{}'", raw)))
}

pub fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw)
        .map_err(|_| ServiceError::InternalError(format!("unknown order status '{}'", raw)))
}

/// Validate a transition, returning the canonical InvalidTransition error.
pub fn ensure_transition(from: RequestStatus, to: RequestStatus) -> Result<(), ServiceError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition(format!(
            "cannot move request from '{}' to '{}'",
            from, to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn statuses_serialize_to_wire_strings() {
        assert_eq!(RequestStatus::EnTransito.to_string(), "en_transito");
        assert_eq!(RequestStatus::Borrador.to_string(), "borrador");
        assert_eq!(OrderStatus::Emitida.to_string(), "emitida");
        assert_eq!(
            RequestStatus::from_str("cotizando").unwrap(),
            RequestStatus::Cotizando
        );
    }

    #[test]
    fn nine_wire_values_plus_draft() {
        // borrador, programada, pendiente, autorizada, cotizando, emitida,
        // en_transito, recibida, rechazada, cancelada
        assert_eq!(RequestStatus::all_values().len(), 10);
    }

    #[rstest]
    #[case(RequestStatus::Pendiente, RequestStatus::Autorizada, true)]
    #[case(RequestStatus::Pendiente, RequestStatus::Rechazada, true)]
    #[case(RequestStatus::Pendiente, RequestStatus::Cancelada, true)]
    #[case(RequestStatus::Borrador, RequestStatus::Pendiente, true)]
    #[case(RequestStatus::Programada, RequestStatus::Pendiente, true)]
    #[case(RequestStatus::Autorizada, RequestStatus::Cotizando, true)]
    #[case(RequestStatus::Cotizando, RequestStatus::Emitida, true)]
    #[case(RequestStatus::Emitida, RequestStatus::EnTransito, true)]
    #[case(RequestStatus::EnTransito, RequestStatus::Recibida, true)]
    #[case(RequestStatus::Autorizada, RequestStatus::Rechazada, false)]
    #[case(RequestStatus::Cotizando, RequestStatus::Autorizada, false)]
    #[case(RequestStatus::Recibida, RequestStatus::Pendiente, false)]
    #[case(RequestStatus::Rechazada, RequestStatus::Pendiente, false)]
    #[case(RequestStatus::Cancelada, RequestStatus::Emitida, false)]
    #[case(RequestStatus::Pendiente, RequestStatus::Emitida, false)]
    #[case(RequestStatus::Borrador, RequestStatus::Autorizada, false)]
    fn transition_table(
        #[case] from: RequestStatus,
        #[case] to: RequestStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed, "{} -> {}", from, to);
    }

    #[test]
    fn same_status_is_noop_not_error() {
        for status in RequestStatus::iter() {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for terminal in [
            RequestStatus::Recibida,
            RequestStatus::Rechazada,
            RequestStatus::Cancelada,
        ] {
            for target in RequestStatus::iter() {
                if target != terminal {
                    assert!(!terminal.can_transition_to(target));
                }
            }
        }
    }

    #[test]
    fn order_status_mirrors_request() {
        assert!(OrderStatus::Emitida.can_transition_to(OrderStatus::EnTransito));
        assert!(OrderStatus::EnTransito.can_transition_to(OrderStatus::Recibida));
        assert!(OrderStatus::Emitida.can_transition_to(OrderStatus::Cancelada));
        assert!(!OrderStatus::Recibida.can_transition_to(OrderStatus::EnTransito));
        assert!(!OrderStatus::Cancelada.can_transition_to(OrderStatus::Emitida));
        assert_eq!(
            OrderStatus::Recibida.as_request_status(),
            RequestStatus::Recibida
        );
    }
}
