mod admin;
mod borrowing;
mod catalog;
mod health_check;
mod helpers;
mod reminders;
mod returns;
mod users;
