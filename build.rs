fn main() {
    // ESP-IDF link arguments are only needed for the firmware build; host
    // builds (unit and integration tests) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
