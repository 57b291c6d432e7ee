use std::sync::Arc;

use handlebars::Handlebars;

pub type Hbs = Arc<Handlebars<'static>>;

pub const PRICE_ALERT_EMAIL: &str = "emails/price_alert";

const PRICE_ALERT_EMAIL_SRC: &str = include_str!("../../templates/emails/price_alert.hbs");

pub fn build_handlebars() -> Hbs {
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);

    if let Err(e) = hbs.register_template_string(PRICE_ALERT_EMAIL, PRICE_ALERT_EMAIL_SRC) {
        tracing::error!("[templates] failed to register {}: {}", PRICE_ALERT_EMAIL, e);
    }

    Arc::new(hbs)
}
