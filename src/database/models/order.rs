use super::FieldKind::{Date, Integer, JsonArray, Number, Text};
use super::{Field, ResourceSpec, Scope};

/// Payment method that marks an order as an installment (BluFacilita) contract.
pub const BLU_FACILITA: &str = "BluFacilita";

pub static ORDERS: ResourceSpec = ResourceSpec {
    name: "Order",
    table: "orders",
    scope: Scope::Organization,
    order_by: "\"order_date\" DESC NULLS LAST, \"created_at\" DESC",
    search_columns: &["customer_name", "product_name", "tracking_code"],
    filters: &["status", "clientId", "supplierId", "paymentMethod"],
    fields: &[
        Field::new("clientId", "client_id", Text).references("clients"),
        Field::new("supplierId", "supplier_id", Text).references("suppliers"),
        Field::new("customerName", "customer_name", Text),
        Field::new("customerContact", "customer_contact", Text),
        Field::new("productName", "product_name", Text).required(),
        Field::new("model", "model", Text),
        Field::new("capacity", "capacity", Text),
        Field::new("color", "color", Text),
        Field::new("condition", "condition", Text),
        Field::new("imei", "imei", Text),
        Field::new("purchasePrice", "purchase_price", Number),
        Field::new("sellingPrice", "selling_price", Number),
        Field::new("shippingCost", "shipping_cost", Number),
        Field::new("orderDate", "order_date", Date),
        Field::new("estimatedDeliveryDate", "estimated_delivery_date", Date),
        Field::new("arrivalDate", "arrival_date", Date),
        Field::new("deliveryDate", "delivery_date", Date),
        Field::new("status", "status", Text),
        Field::new("paymentMethod", "payment_method", Text),
        Field::new("downPayment", "down_payment", Number),
        Field::new("installments", "installments", Integer),
        Field::new("installmentValue", "installment_value", Number),
        Field::new("interestRate", "interest_rate", Number),
        Field::new("financedAmount", "financed_amount", Number),
        Field::new("trackingCode", "tracking_code", Text),
        Field::new("trackingHistory", "tracking_history", JsonArray),
        Field::new("documents", "documents", JsonArray),
        Field::new("bluFacilitaInstallments", "blu_facilita_installments", JsonArray),
        Field::new("internalNotes", "internal_notes", JsonArray),
        Field::new("arrivalPhotos", "arrival_photos", JsonArray),
        Field::new("observations", "observations", Text),
    ],
    has_updated_at: true,
};
