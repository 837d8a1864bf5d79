pub mod momo_sms;
