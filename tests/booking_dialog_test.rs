//! Booking dialog tests
//!
//! Drive the client flow through the top-level router with in-memory
//! collaborators and check the persisted tokens and outgoing messages.

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use ConsultBot::dialog::{Command, TurnOutcome};
use ConsultBot::models::AgeCategory;
use ConsultBot::services::{InlineButton, Keyboard};

const MENU_GREETING: &str = "Здравствуйте!";

fn seeded_bot() -> TestBot {
    let bot = TestBot::new();
    bot.catalog.add(AgeCategory::ZeroSix, "Sleep", None);
    bot.catalog.add(AgeCategory::ZeroSix, "Feeding", None);
    bot.catalog.add(AgeCategory::SixOneYear, "Webinar", Some("https://example.com/webinar"));
    bot
}

#[tokio::test]
async fn test_menu_command_opens_booking_menu() {
    let bot = seeded_bot();

    let outcome = bot.command(CLIENT_ID, Command::Menu).await.unwrap();

    assert_eq!(outcome, TurnOutcome::Advanced { state: Some("user_services__menu".to_string()) });
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__menu"));
    let texts = bot.messenger.texts_to(CLIENT_ID);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with(MENU_GREETING));
    assert_eq!(
        bot.messenger.last_keyboard(CLIENT_ID).unwrap().callback_data(),
        vec!["get_consultation"]
    );
}

#[tokio::test]
async fn test_category_choice_lists_services() {
    let bot = seeded_bot();
    bot.command(CLIENT_ID, Command::Menu).await.unwrap();

    bot.press(CLIENT_ID, "get_consultation").await.unwrap();
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__select_age_category"));
    assert_eq!(
        bot.messenger.last_keyboard(CLIENT_ID).unwrap().callback_data(),
        vec!["ZERO_SIX", "SIX_ONE_YEAR", "OLDER_ONE_YEAR"]
    );

    bot.press(CLIENT_ID, "ZERO_SIX").await.unwrap();
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__select_service__{}"));
    assert_eq!(bot.messenger.texts_to(CLIENT_ID).last().unwrap(), "Выберите проблему");
    assert_eq!(
        bot.messenger.last_keyboard(CLIENT_ID),
        Some(Keyboard::Inline(vec![
            InlineButton::callback("1", "Sleep"),
            InlineButton::callback("2", "Feeding"),
        ]))
    );
}

#[tokio::test]
async fn test_text_instead_of_start_button_shows_menu_again() {
    let bot = seeded_bot();
    bot.command(CLIENT_ID, Command::Menu).await.unwrap();

    bot.text(CLIENT_ID, "hello").await.unwrap();

    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__menu"));
    let texts = bot.messenger.texts_to(CLIENT_ID);
    assert_eq!(texts.len(), 2);
    assert!(texts[1].starts_with(MENU_GREETING));
}

#[tokio::test]
async fn test_rejected_answer_keeps_state_and_skips_business_logic() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__select_age_category");

    let outcome = bot.text(CLIENT_ID, "ZERO_SIX").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Rejected);
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__select_age_category"));
    assert_eq!(bot.catalog.calls(), 0);
    assert_eq!(
        bot.messenger.texts_to(CLIENT_ID),
        vec!["Похоже, вы не выбрали возрастную категорию. Пожалуйста выберите.".to_string()]
    );
    assert_eq!(bot.messenger.last_keyboard(CLIENT_ID), Some(Keyboard::None));
}

#[tokio::test]
async fn test_empty_category_redirects_to_menu() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__select_age_category");

    let outcome = bot.press(CLIENT_ID, "OLDER_ONE_YEAR").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Advanced { state: Some("user_services__menu".to_string()) });
    let texts = bot.messenger.texts_to(CLIENT_ID);
    assert_eq!(texts[0], "В этой категории пока нет услуг.");
    assert!(texts[1].starts_with(MENU_GREETING));

    let user = bot.users.user(CLIENT_ID).unwrap();
    assert_eq!(user.state, "user_services__menu");
    assert_eq!(user.previous_state.as_deref(), Some("user_services__select_service"));
}

#[tokio::test]
async fn test_link_service_offers_link_and_returns_to_menu() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__select_service__{}");

    bot.press(CLIENT_ID, "3").await.unwrap();

    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__menu"));
    let card = bot.messenger.texts_to(CLIENT_ID).pop().unwrap();
    assert!(card.starts_with("<b>Webinar</b>\n<b>Описание:</b>\n"));
    assert!(card.ends_with("<b>Возрастная категория: </b>от 6 месяцев до года"));
    assert_eq!(
        bot.messenger.last_keyboard(CLIENT_ID),
        Some(Keyboard::Inline(vec![
            InlineButton::link("перейти по ссылке", "https://example.com/webinar"),
            InlineButton::callback("menu", "Вернуться в меню"),
        ]))
    );
}

#[tokio::test]
async fn test_missing_service_is_rejected() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__select_service__{}");

    let outcome = bot.press(CLIENT_ID, "99").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Rejected);
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__select_service__{}"));
}

#[tokio::test]
async fn test_full_booking_creates_appointment_and_notifies_admin() {
    let bot = seeded_bot();
    bot.command(CLIENT_ID, Command::Menu).await.unwrap();
    bot.press(CLIENT_ID, "get_consultation").await.unwrap();
    bot.press(CLIENT_ID, "ZERO_SIX").await.unwrap();

    bot.press(CLIENT_ID, "1").await.unwrap();
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__show_service"));
    assert_eq!(
        bot.messenger.last_keyboard(CLIENT_ID).unwrap().callback_data(),
        vec!["appoint__1"]
    );

    bot.press(CLIENT_ID, "appoint__1").await.unwrap();
    assert_eq!(
        bot.state(CLIENT_ID).as_deref(),
        Some(r#"user_services__what_is_name__{"service_id": 1}"#)
    );

    bot.text(CLIENT_ID, "Anna").await.unwrap();
    bot.text(CLIENT_ID, "Wakes up at night").await.unwrap();
    bot.text(CLIENT_ID, "Sleep through").await.unwrap();
    bot.text(CLIENT_ID, "+7 900 123-45-67").await.unwrap();
    assert_eq!(
        bot.state(CLIENT_ID).as_deref(),
        Some(r#"user_services__agreement__{"service_id": 1, "name": "Anna", "problem": "Wakes up at night", "request": "Sleep through", "phone_number": "+7 900 123-45-67"}"#)
    );

    bot.messenger.take();
    let outcome = bot.press(CLIENT_ID, "agree").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Advanced { state: Some("user_services__menu".to_string()) });

    let appointments = bot.appointments.all();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].service_id, Some(1));
    assert_eq!(appointments[0].client_name, "Anna");
    assert_eq!(appointments[0].phone_number, "+7 900 123-45-67");
    assert_eq!(appointments[0].username.as_deref(), Some("client"));
    assert_eq!(appointments[0].date, today());

    let admin_texts = bot.messenger.texts_to(ADMIN_ID);
    assert_eq!(admin_texts.len(), 1);
    assert!(admin_texts[0].starts_with("<b>Поступила заявка на консультацию</b>"));
    assert!(admin_texts[0].contains("<b>Алиас:</b> @client"));

    let client_texts = bot.messenger.texts_to(CLIENT_ID);
    assert_eq!(client_texts[0], "Ваша заявка принята, в ближайшее время я с Вами свяжусь");
    assert!(client_texts[1].starts_with(MENU_GREETING));
    assert_matches!(bot.messenger.sent().first(), Some(Sent::Text { chat_id: ADMIN_ID, .. }));
}

#[tokio::test]
async fn test_agreement_requires_button() {
    let bot = seeded_bot();
    bot.users.put(
        CLIENT_ID,
        r#"user_services__agreement__{"service_id": 1, "name": "Anna", "problem": "p", "request": "r", "phone_number": "1"}"#,
    );

    let outcome = bot.text(CLIENT_ID, "yes").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Rejected);
    assert!(bot.appointments.all().is_empty());
    assert!(bot.messenger.texts_to(ADMIN_ID).is_empty());
}

#[tokio::test]
async fn test_storage_failure_sends_generic_reply() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__menu");
    bot.users.fail_writes();

    let outcome = bot.press(CLIENT_ID, "get_consultation").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some("user_services__menu"));
    assert_eq!(
        bot.messenger.texts_to(CLIENT_ID).last().map(String::as_str),
        Some(ConsultBot::dialog::GENERIC_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn test_failed_booking_save_keeps_agreement_step() {
    let bot = seeded_bot();
    let agreement = r#"user_services__agreement__{"service_id": 1, "name": "Anna", "problem": "p", "request": "r", "phone_number": "1"}"#;
    bot.users.put(CLIENT_ID, agreement);
    bot.appointments.fail_writes();

    let outcome = bot.press(CLIENT_ID, "agree").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(bot.state(CLIENT_ID).as_deref(), Some(agreement));
    assert!(bot.appointments.all().is_empty());
    assert!(bot.messenger.texts_to(ADMIN_ID).is_empty());
    assert_eq!(
        bot.messenger.texts_to(CLIENT_ID),
        vec![ConsultBot::dialog::GENERIC_FAILURE_MESSAGE.to_string()]
    );
}

#[tokio::test]
async fn test_catalog_failure_while_listing_returns_to_menu() {
    let bot = seeded_bot();
    bot.users.put(CLIENT_ID, "user_services__select_age_category");
    bot.catalog.fail_reads();

    let outcome = bot.press(CLIENT_ID, "ZERO_SIX").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Advanced { state: Some("user_services__menu".to_string()) });
    let texts = bot.messenger.texts_to(CLIENT_ID);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "Ошибка!");
    assert!(texts[1].starts_with(MENU_GREETING));

    let user = bot.users.user(CLIENT_ID).unwrap();
    assert_eq!(user.state, "user_services__menu");
    assert_eq!(user.previous_state.as_deref(), Some("user_services__select_service"));
}
