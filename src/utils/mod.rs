pub mod db_utils;
pub mod excel;
pub mod mailer;
pub mod pagination;
