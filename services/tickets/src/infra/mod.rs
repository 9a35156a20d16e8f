pub mod db;
pub mod mailer;
pub mod mercado_pago;
