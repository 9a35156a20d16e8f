mod conf_scenario_test;
mod helpers;
mod orders_test;
mod payments_test;
mod reservation_property_test;
mod tokens_test;
mod worker_test;
