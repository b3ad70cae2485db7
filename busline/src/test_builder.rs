//! Test file for BusBuilder functionality

#[cfg(test)]
mod tests {
    use crate::{BusConfig, ConfigError, Event, EventBus, FamilyRole, FamilyType};

    trait TestEvent: Event {}
    trait TestListener: Send + Sync {}

    type TestBus = EventBus<dyn TestEvent, dyn TestListener>;

    fn families() -> crate::BusBuilder<dyn TestEvent, dyn TestListener> {
        TestBus::builder()
            .event_family(FamilyType::of::<dyn TestEvent>())
            .listener_family(FamilyType::of::<dyn TestListener>())
    }

    #[test]
    fn test_event_bus_builder() {
        let bus = families()
            .with_capacity(1000)
            .with_max_handlers_per_event(8)
            .build()
            .unwrap();

        let config = bus.config();
        assert_eq!(config.initial_capacity, 1000);
        assert_eq!(config.max_handlers_per_event, Some(8));
    }

    #[test]
    fn test_event_bus_builder_defaults() {
        let bus = families().build().unwrap();
        let config = bus.config();

        // Check default values
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_handlers_per_event, None);
        assert_eq!(bus.total_handler_count(), 0);
    }

    #[test]
    fn test_event_bus_builder_with_config() {
        let config = BusConfig {
            initial_capacity: 4,
            ..Default::default()
        };
        let bus = families().with_config(config.clone()).build().unwrap();
        assert_eq!(bus.config(), &config);
    }

    #[test]
    fn test_event_family_is_checked_first() {
        struct NotAFamily;

        let error = TestBus::builder()
            .event_family(FamilyType::of::<NotAFamily>())
            .listener_family(FamilyType::of::<NotAFamily>())
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::NotInterface {
                role: FamilyRole::Event,
                ..
            }
        ));
    }

    #[test]
    fn test_swapped_families_are_rejected() {
        let error = TestBus::builder()
            .event_family(FamilyType::of::<dyn TestListener>())
            .listener_family(FamilyType::of::<dyn TestEvent>())
            .build()
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            format!(
                "event family mismatch: bus expects `{}`, builder was given `{}`",
                std::any::type_name::<dyn TestEvent>(),
                std::any::type_name::<dyn TestListener>()
            )
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: BusConfig =
            serde_json::from_str(r#"{ "max_handlers_per_event": 3 }"#).unwrap();
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_handlers_per_event, Some(3));

        let bus = families().with_config(config).build().unwrap();
        assert_eq!(bus.config().max_handlers_per_event, Some(3));
    }
}
