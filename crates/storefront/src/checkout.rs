//! Checkout message composer.
//!
//! Checkout never talks to a server: the cart and the customer's details are
//! rendered into a plain-text message, and the message is handed to the
//! messaging service through a deep link of the form
//! `https://wa.me/<phone>?text=<percent-encoded message>`.
//!
//! Everything here is a pure function of its inputs except [`checkout`],
//! which also empties the cart once the link has been built.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tienda_core::{CartSnapshot, PhoneNumber};
use tracing::{info, instrument, warn};
use url::Url;

use crate::cart::{CartStorage, CartStore};
use crate::cms::StoreConfig;
use crate::config::MessagingConfig;

/// Errors raised while preparing a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required form field was left blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Cart is empty")]
    EmptyCart,

    /// Neither the CMS nor the environment provides an order number.
    #[error("No order phone number configured")]
    MissingPhone,

    #[error("Invalid deep link: {0}")]
    Url(#[from] url::ParseError),
}

/// Currency the customer will pay in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCurrency {
    #[default]
    Usd,
    Zelle,
    Cup,
    Mixto,
}

impl PaymentCurrency {
    /// All currencies, in the order they are offered.
    pub const ALL: [Self; 4] = [Self::Usd, Self::Zelle, Self::Cup, Self::Mixto];

    /// Form value, e.g. `usd`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Zelle => "zelle",
            Self::Cup => "cup",
            Self::Mixto => "mixto",
        }
    }
}

/// Renders the upper-cased form value used in messages.
impl fmt::Display for PaymentCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for PaymentCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown payment currency '{s}' (expected usd, zelle, cup or mixto)")
            })
    }
}

/// Delivery and contact details collected at checkout.
///
/// Values are kept as entered; they are echoed verbatim into the order
/// message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    /// Delivery date.
    pub date: String,
    /// Delivery time.
    pub time: String,
    /// Full name.
    pub name: String,
    /// National identity card number ("C.I").
    pub national_id: String,
    pub address: String,
    pub municipality: String,
    pub province: String,
    /// Landmarks near the address. The only optional field.
    #[serde(default)]
    pub reference: String,
    /// Customer contact phone, free-form.
    pub phone: String,
    #[serde(default)]
    pub payment: PaymentCurrency,
}

impl CheckoutForm {
    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingField`] naming the first blank
    /// required field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("date", &self.date),
            ("time", &self.time),
            ("name", &self.name),
            ("national_id", &self.national_id),
            ("address", &self.address),
            ("municipality", &self.municipality),
            ("province", &self.province),
            ("phone", &self.phone),
        ];
        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(CheckoutError::MissingField(field)),
            None => Ok(()),
        }
    }
}

/// Append one `• name xqty - $total` line per cart line.
fn push_lines(message: &mut String, snapshot: &CartSnapshot) {
    for line in snapshot.lines() {
        let _ = writeln!(
            message,
            "• {} x{} - ${}",
            line.name,
            line.quantity,
            line.line_total()
        );
    }
}

/// Compose the full order message sent from the checkout form.
///
/// An empty `delivery_note` is left out.
#[must_use]
pub fn order_message(snapshot: &CartSnapshot, form: &CheckoutForm, delivery_note: &str) -> String {
    let mut message = String::from("*Nuevo Pedido*\n\n");

    let fields = [
        ("Fecha", form.date.as_str()),
        ("Hora de entrega", form.time.as_str()),
        ("Nombre y apellidos", form.name.as_str()),
        ("C.I", form.national_id.as_str()),
        ("Dirección", form.address.as_str()),
        ("Municipio", form.municipality.as_str()),
        ("Provincia", form.province.as_str()),
        ("Puntos de referencia", form.reference.as_str()),
        ("Número telefónico", form.phone.as_str()),
    ];
    for (label, value) in fields {
        let _ = writeln!(message, "*{label}:* {}", value.trim());
    }
    let _ = writeln!(message, "*Tipo de moneda:* {}\n", form.payment);

    message.push_str("*Productos:*\n");
    push_lines(&mut message, snapshot);
    let _ = write!(message, "\n*Total: ${}*", snapshot.total_price());

    let note = delivery_note.trim();
    if !note.is_empty() {
        let _ = write!(message, "\n\n_{note}_");
    }
    message
}

/// Compose the quick order message sent straight from the cart panel.
#[must_use]
pub fn cart_message(snapshot: &CartSnapshot, prefix: &str) -> String {
    let mut message = format!("{prefix}\n\n");
    push_lines(&mut message, snapshot);
    let _ = write!(message, "\n*Total: ${}*", snapshot.total_price());
    message
}

/// Compose the single-product inquiry sent from a product page.
#[must_use]
pub fn inquiry_message(product_name: &str, quantity: u32) -> String {
    format!("Hola! Me interesa: {product_name} (cantidad: {quantity})")
}

/// Build the messaging deep link `<base>/<phone>?text=<message>`.
///
/// The message is percent-encoded in full, so it survives any characters
/// including newlines, `&` and `#`.
///
/// # Errors
///
/// Returns [`CheckoutError::Url`] if the result is not a valid URL.
pub fn deep_link(base_url: &Url, phone: &PhoneNumber, message: &str) -> Result<Url, CheckoutError> {
    let link = format!(
        "{}/{}?text={}",
        base_url.as_str().trim_end_matches('/'),
        phone.as_str(),
        urlencoding::encode(message)
    );
    Ok(Url::parse(&link)?)
}

/// Pick the order phone number.
///
/// The CMS store config's WhatsApp number wins; the environment fallback is
/// used when the CMS has none or it does not parse.
#[must_use]
pub fn resolve_phone(
    store_config: Option<&StoreConfig>,
    messaging: &MessagingConfig,
) -> Option<PhoneNumber> {
    let from_cms = store_config
        .and_then(|config| config.whatsapp_number.as_deref())
        .filter(|number| !number.trim().is_empty())
        .and_then(|number| match PhoneNumber::parse(number) {
            Ok(phone) => Some(phone),
            Err(e) => {
                warn!(error = %e, "Ignoring invalid WhatsApp number from CMS");
                None
            }
        });

    from_cms.or_else(|| messaging.phone.clone())
}

/// Complete a checkout: validate, compose the order, and empty the cart.
///
/// Returns the deep link to open. The cart is only cleared once the link has
/// been built successfully.
///
/// # Errors
///
/// Returns error if the form is incomplete, the cart is empty, no phone
/// number is available, or the link cannot be built.
#[instrument(skip_all, fields(lines = cart.len()))]
pub fn checkout<S: CartStorage>(
    cart: &mut CartStore<S>,
    form: &CheckoutForm,
    phone: Option<&PhoneNumber>,
    messaging: &MessagingConfig,
) -> Result<Url, CheckoutError> {
    form.validate()?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let phone = phone.ok_or(CheckoutError::MissingPhone)?;

    let message = order_message(cart.snapshot(), form, &messaging.delivery_note);
    let link = deep_link(&messaging.base_url, phone, &message)?;

    cart.clear();
    info!(payment = form.payment.as_str(), "Order composed");
    Ok(link)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tienda_core::{CartProduct, Price, ProductId, RecordId};

    use super::*;
    use crate::cart::MemoryStorage;

    fn product(id: i64, name: &str, price: &str) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Price::new(price.parse::<Decimal>().unwrap()).unwrap(),
            image: "/placeholder.jpg".to_string(),
            slug: name.to_lowercase(),
        }
    }

    fn snapshot() -> CartSnapshot {
        [
            product(1, "Café", "10").with_quantity(2),
            product(2, "Azúcar", "1250.5").with_quantity(1),
        ]
        .into_iter()
        .collect()
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            date: "2025-03-01".to_string(),
            time: "14:00".to_string(),
            name: "Ana Pérez".to_string(),
            national_id: "85010112345".to_string(),
            address: "Calle 1 #23".to_string(),
            municipality: "Bayamo".to_string(),
            province: "Granma".to_string(),
            reference: String::new(),
            phone: "5355551234".to_string(),
            payment: PaymentCurrency::Zelle,
        }
    }

    fn messaging(phone: Option<&str>) -> MessagingConfig {
        MessagingConfig {
            base_url: Url::parse("https://wa.me").unwrap(),
            phone: phone.map(|p| PhoneNumber::parse(p).unwrap()),
            message_prefix: "Hola! Me gustaría hacer un pedido:".to_string(),
            delivery_note: "Nota: Domicilio gratis solo en la ciudad de Bayamo.".to_string(),
        }
    }

    fn store_config(whatsapp: Option<&str>) -> StoreConfig {
        StoreConfig {
            id: RecordId::new(1),
            store_name: "La Bodega".to_string(),
            description: String::new(),
            logo: None,
            email: String::new(),
            phone: String::new(),
            whatsapp_number: whatsapp.map(str::to_string),
            address: None,
            social_media: None,
            created_at: None,
            updated_at: None,
            published_at: None,
        }
    }

    #[test]
    fn test_payment_currency_parse_and_display() {
        assert_eq!("MIXTO".parse::<PaymentCurrency>().unwrap(), PaymentCurrency::Mixto);
        assert_eq!(PaymentCurrency::default(), PaymentCurrency::Usd);
        assert_eq!(PaymentCurrency::Zelle.to_string(), "ZELLE");
        assert!("euro".parse::<PaymentCurrency>().is_err());
    }

    #[test]
    fn test_validate_requires_all_but_reference() {
        assert!(form().validate().is_ok());

        let mut missing = form();
        missing.national_id = "  ".to_string();
        assert!(matches!(
            missing.validate(),
            Err(CheckoutError::MissingField("national_id"))
        ));
    }

    #[test]
    fn test_order_message() {
        let message = order_message(&snapshot(), &form(), "Nota: Domicilio gratis.");
        let expected = "*Nuevo Pedido*\n\n\
            *Fecha:* 2025-03-01\n\
            *Hora de entrega:* 14:00\n\
            *Nombre y apellidos:* Ana Pérez\n\
            *C.I:* 85010112345\n\
            *Dirección:* Calle 1 #23\n\
            *Municipio:* Bayamo\n\
            *Provincia:* Granma\n\
            *Puntos de referencia:* \n\
            *Número telefónico:* 5355551234\n\
            *Tipo de moneda:* ZELLE\n\n\
            *Productos:*\n\
            • Café x2 - $20\n\
            • Azúcar x1 - $1,250.5\n\
            \n*Total: $1,270.5*\n\n\
            _Nota: Domicilio gratis._";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_order_message_without_note() {
        let message = order_message(&snapshot(), &form(), "");
        assert!(message.ends_with("*Total: $1,270.5*"));
    }

    #[test]
    fn test_cart_message() {
        let message = cart_message(&snapshot(), "Hola!");
        assert_eq!(
            message,
            "Hola!\n\n• Café x2 - $20\n• Azúcar x1 - $1,250.5\n\n*Total: $1,270.5*"
        );
    }

    #[test]
    fn test_inquiry_message() {
        assert_eq!(
            inquiry_message("Café Serrano", 3),
            "Hola! Me interesa: Café Serrano (cantidad: 3)"
        );
    }

    #[test]
    fn test_deep_link_encodes_message() {
        let base = Url::parse("https://wa.me/").unwrap();
        let phone = PhoneNumber::parse("+53 5555-1234").unwrap();
        let link = deep_link(&base, &phone, "Hola & adiós\n#1").unwrap();

        assert_eq!(
            link.as_str(),
            "https://wa.me/5355551234?text=Hola%20%26%20adi%C3%B3s%0A%231"
        );
        let text = link.query_pairs().find(|(k, _)| k == "text").unwrap().1;
        assert_eq!(text, "Hola & adiós\n#1");
    }

    #[test]
    fn test_resolve_phone_prefers_cms() {
        let config = messaging(Some("5300000000"));

        let cms = store_config(Some("+53 5111 1111"));
        assert_eq!(
            resolve_phone(Some(&cms), &config).unwrap().as_str(),
            "5351111111"
        );

        let blank = store_config(Some(""));
        assert_eq!(
            resolve_phone(Some(&blank), &config).unwrap().as_str(),
            "5300000000"
        );

        let invalid = store_config(Some("call us"));
        assert_eq!(
            resolve_phone(Some(&invalid), &config).unwrap().as_str(),
            "5300000000"
        );

        assert_eq!(
            resolve_phone(None, &config).unwrap().as_str(),
            "5300000000"
        );
        assert!(resolve_phone(None, &messaging(None)).is_none());
    }

    #[test]
    fn test_checkout_clears_cart_and_returns_link() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, "Café", "10"), 2);
        let phone = PhoneNumber::parse("5355551234").unwrap();

        let link = checkout(&mut cart, &form(), Some(&phone), &messaging(None)).unwrap();

        assert!(cart.is_empty());
        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/5355551234");
        let text = link.query_pairs().find(|(k, _)| k == "text").unwrap().1;
        assert!(text.starts_with("*Nuevo Pedido*"));
        assert!(text.contains("• Café x2 - $20"));
        assert!(text.ends_with("_Nota: Domicilio gratis solo en la ciudad de Bayamo._"));
    }

    #[test]
    fn test_checkout_failures_keep_cart() {
        let phone = PhoneNumber::parse("5355551234").unwrap();

        let mut empty = CartStore::open(MemoryStorage::new());
        assert!(matches!(
            checkout(&mut empty, &form(), Some(&phone), &messaging(None)),
            Err(CheckoutError::EmptyCart)
        ));

        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, "Café", "10"), 1);

        assert!(matches!(
            checkout(&mut cart, &form(), None, &messaging(None)),
            Err(CheckoutError::MissingPhone)
        ));

        let incomplete = CheckoutForm::default();
        assert!(matches!(
            checkout(&mut cart, &incomplete, Some(&phone), &messaging(None)),
            Err(CheckoutError::MissingField("date"))
        ));

        assert_eq!(cart.len(), 1);
    }
}
