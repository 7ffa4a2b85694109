//! Shipment entity and delivery address.

use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};

const ENTITY: &str = "shipment";

/// The status of a shipment.
///
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    └────────────┴────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Processing => "processing",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shipping speed tag.
///
/// The three service levels are known; any other tag is kept verbatim and
/// gets the default lead time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShippingMethod {
    Express,
    Standard,
    Economy,
    Other(String),
}

impl ShippingMethod {
    const DEFAULT_LEAD_TIME_DAYS: i64 = 7;

    /// Days between dispatch and expected delivery.
    pub fn lead_time_days(&self) -> i64 {
        match self {
            ShippingMethod::Express => 2,
            ShippingMethod::Standard => 5,
            ShippingMethod::Economy => 10,
            ShippingMethod::Other(_) => Self::DEFAULT_LEAD_TIME_DAYS,
        }
    }

    /// Expected delivery date for a shipment created at `from`.
    pub fn estimated_delivery(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::days(self.lead_time_days())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShippingMethod::Express => "express",
            ShippingMethod::Standard => "standard",
            ShippingMethod::Economy => "economy",
            ShippingMethod::Other(tag) => tag,
        }
    }
}

impl From<&str> for ShippingMethod {
    fn from(tag: &str) -> Self {
        match tag {
            "express" => ShippingMethod::Express,
            "standard" => ShippingMethod::Standard,
            "economy" => ShippingMethod::Economy,
            other => ShippingMethod::Other(other.to_string()),
        }
    }
}

impl From<String> for ShippingMethod {
    fn from(tag: String) -> Self {
        ShippingMethod::from(tag.as_str())
    }
}

impl From<ShippingMethod> for String {
    fn from(method: ShippingMethod) -> Self {
        match method {
            ShippingMethod::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery address. Street, city and country are required.
///
/// Deserialization goes through [`Address::new`], so a stored address is
/// validated the same way as a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressFields")]
pub struct Address {
    street: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

#[derive(Deserialize)]
struct AddressFields {
    street: String,
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    postal_code: String,
    country: String,
}

impl TryFrom<AddressFields> for Address {
    type Error = DomainError;

    fn try_from(fields: AddressFields) -> Result<Self> {
        Address::new(
            fields.street,
            fields.city,
            fields.state,
            fields.postal_code,
            fields.country,
        )
    }
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self> {
        let address = Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        };

        if [&address.street, &address.city, &address.country]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(DomainError::InvalidArgument(
                "street, city, and country are required".to_string(),
            ));
        }
        Ok(address)
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Single-line rendering: `street, city, state postal, country`.
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.postal_code, self.country
        )
    }
}

/// Physical fulfillment of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    id: AggregateId,
    #[serde(default)]
    version: Version,
    order_id: AggregateId,
    tracking_number: Option<String>,
    carrier: Option<String>,
    shipping_method: ShippingMethod,
    address: Address,
    status: ShipmentStatus,
    estimated_date: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Shipment {
    fn aggregate_type() -> &'static str {
        "Shipment"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Shipment {
    pub fn order_id(&self) -> AggregateId {
        self.order_id
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    pub fn shipping_method(&self) -> &ShippingMethod {
        &self.shipping_method
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn estimated_date(&self) -> Option<DateTime<Utc>> {
        self.estimated_date
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_delivered(&self) -> bool {
        self.status == ShipmentStatus::Delivered
    }

    pub fn can_be_cancelled(&self) -> bool {
        !self.status.is_terminal()
    }
}

// Command methods
impl Shipment {
    /// Creates a pending shipment.
    pub fn create(
        id: AggregateId,
        order_id: AggregateId,
        address: Address,
        shipping_method: ShippingMethod,
    ) -> Result<Self> {
        if order_id.is_nil() {
            return Err(DomainError::InvalidArgument(
                "order id cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            version: Version::initial(),
            order_id,
            tracking_number: None,
            carrier: None,
            shipping_method,
            address,
            status: ShipmentStatus::Pending,
            estimated_date: None,
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn start_processing(&mut self) -> Result<()> {
        if self.status != ShipmentStatus::Pending {
            return Err(DomainError::invalid_transition(
                ENTITY,
                self.status,
                "start processing",
            ));
        }
        self.status = ShipmentStatus::Processing;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Hands the parcel to a carrier. Legal only from `processing`.
    pub fn ship(
        &mut self,
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Result<()> {
        if self.status != ShipmentStatus::Processing {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "ship"));
        }
        let tracking_number = tracking_number.into();
        if tracking_number.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "tracking number is required".to_string(),
            ));
        }

        let now = Utc::now();
        self.status = ShipmentStatus::Shipped;
        self.tracking_number = Some(tracking_number);
        self.carrier = Some(carrier.into());
        self.shipped_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<()> {
        if self.status != ShipmentStatus::Shipped {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "deliver"));
        }
        let now = Utc::now();
        self.status = ShipmentStatus::Delivered;
        self.delivered_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the shipment unless it was already delivered or cancelled.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.can_be_cancelled() {
            return Err(DomainError::invalid_transition(ENTITY, self.status, "cancel"));
        }
        self.status = ShipmentStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_estimated_delivery_date(&mut self, date: DateTime<Utc>) {
        self.estimated_date = Some(date);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::new("1 Main St", "Springfield", "IL", "62701", "US").unwrap()
    }

    fn pending_shipment() -> Shipment {
        Shipment::create(
            AggregateId::new(),
            AggregateId::new(),
            address(),
            ShippingMethod::Standard,
        )
        .unwrap()
    }

    fn shipped_shipment() -> Shipment {
        let mut shipment = pending_shipment();
        shipment.start_processing().unwrap();
        shipment.ship("1Z999", "UPS").unwrap();
        shipment
    }

    #[test]
    fn test_address_requires_street_city_country() {
        assert!(Address::new("", "Springfield", "", "", "US").is_err());
        assert!(Address::new("1 Main St", " ", "", "", "US").is_err());
        assert!(Address::new("1 Main St", "Springfield", "", "", "").is_err());
        assert!(Address::new("1 Main St", "Springfield", "", "", "US").is_ok());
    }

    #[test]
    fn test_address_deserialization_validates() {
        let json = serde_json::to_value(address()).unwrap();
        let back: Address = serde_json::from_value(json).unwrap();
        assert_eq!(back, address());

        let blank_city = serde_json::json!({
            "street": "1 Main St",
            "city": "  ",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        });
        assert!(serde_json::from_value::<Address>(blank_city).is_err());

        let mut shipment = serde_json::to_value(pending_shipment()).unwrap();
        shipment["address"]["street"] = serde_json::json!("");
        assert!(serde_json::from_value::<Shipment>(shipment).is_err());
    }

    #[test]
    fn test_full_address() {
        assert_eq!(
            address().full_address(),
            "1 Main St, Springfield, IL 62701, US"
        );
    }

    #[test]
    fn test_create_rejects_nil_order() {
        let result = Shipment::create(
            AggregateId::new(),
            AggregateId::nil(),
            address(),
            ShippingMethod::Express,
        );
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut shipment = pending_shipment();
        assert_eq!(shipment.status(), ShipmentStatus::Pending);

        shipment.start_processing().unwrap();
        assert_eq!(shipment.status(), ShipmentStatus::Processing);

        shipment.ship("1Z999", "UPS").unwrap();
        assert_eq!(shipment.status(), ShipmentStatus::Shipped);
        assert_eq!(shipment.tracking_number(), Some("1Z999"));
        assert_eq!(shipment.carrier(), Some("UPS"));
        assert!(shipment.shipped_at().is_some());

        shipment.deliver().unwrap();
        assert!(shipment.is_delivered());
        assert!(shipment.delivered_at().is_some());
    }

    #[test]
    fn test_ship_requires_processing_and_tracking_number() {
        let mut shipment = pending_shipment();
        assert!(matches!(
            shipment.ship("1Z999", "UPS"),
            Err(DomainError::InvalidTransition { .. })
        ));

        shipment.start_processing().unwrap();
        assert!(matches!(
            shipment.ship("", "UPS"),
            Err(DomainError::InvalidArgument(_))
        ));
        assert_eq!(shipment.status(), ShipmentStatus::Processing);
        assert!(shipment.shipped_at().is_none());
    }

    #[test]
    fn test_start_processing_only_from_pending() {
        let mut shipment = pending_shipment();
        shipment.start_processing().unwrap();
        assert!(shipment.start_processing().is_err());
    }

    #[test]
    fn test_deliver_only_from_shipped() {
        let mut shipment = pending_shipment();
        assert!(shipment.deliver().is_err());
        shipment.start_processing().unwrap();
        assert!(shipment.deliver().is_err());
    }

    #[test]
    fn test_cancel_unless_delivered() {
        let mut pending = pending_shipment();
        pending.cancel().unwrap();
        assert_eq!(pending.status(), ShipmentStatus::Cancelled);

        let mut shipped = shipped_shipment();
        shipped.cancel().unwrap();
        assert_eq!(shipped.status(), ShipmentStatus::Cancelled);

        let mut delivered = shipped_shipment();
        delivered.deliver().unwrap();
        assert!(!delivered.can_be_cancelled());
        assert!(delivered.cancel().is_err());
        assert!(delivered.is_delivered());
    }

    #[test]
    fn test_lead_times() {
        assert_eq!(ShippingMethod::from("express").lead_time_days(), 2);
        assert_eq!(ShippingMethod::from("standard").lead_time_days(), 5);
        assert_eq!(ShippingMethod::from("economy").lead_time_days(), 10);
        assert_eq!(ShippingMethod::from("drone").lead_time_days(), 7);

        let now = Utc::now();
        assert_eq!(
            ShippingMethod::Express.estimated_delivery(now),
            now + Duration::days(2)
        );
    }

    #[test]
    fn test_shipping_method_serialization() {
        let json = serde_json::to_string(&ShippingMethod::Economy).unwrap();
        assert_eq!(json, "\"economy\"");

        let other: ShippingMethod = serde_json::from_str("\"same_day\"").unwrap();
        assert_eq!(other, ShippingMethod::Other("same_day".to_string()));
        assert_eq!(other.to_string(), "same_day");
    }

    #[test]
    fn test_set_estimated_delivery_date() {
        let mut shipment = pending_shipment();
        let date = Utc::now() + Duration::days(3);
        shipment.set_estimated_delivery_date(date);
        assert_eq!(shipment.estimated_date(), Some(date));
    }
}
