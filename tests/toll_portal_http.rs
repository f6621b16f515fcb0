use mockito::Matcher;
use toll_reconciler::components::toll_portal::{normalize_statement, PortalScraper, PrefixRules};
use toll_reconciler::components::StatementSource;
use toll_reconciler::error::Error;
use toll_reconciler::utils::time::Period;

const HOME_PAGE: &str = r##"
<html><body>
  <a class="js-btnLogin" href="#">Log in</a>
  <div class="modal">
    <form action="/account/login" method="post">
      <input type="hidden" name="__RequestVerificationToken" value="csrf-42">
      <input type="text" name="UserName" id="loginReturnDialog">
      <input type="password" name="Password" id="passwordReturnDialog">
      <button type="button" id="btnReturnLogin">Log In</button>
    </form>
  </div>
</body></html>"##;

const STATEMENT_PAGE: &str = r#"
<html><body>
  <button id="btnFiler">Filter</button>
  <div class="ezpass-container-table">
    <table>
      <thead><tr><th>Transaction Date/Time</th><th>Description</th><th>Amount</th></tr></thead>
      <tbody>
        <tr><td>03/02/2023 07:38:55 AM</td><td>TOLL - Bedford Plaza</td><td>$  2.50</td></tr>
      </tbody>
    </table>
  </div>
</body></html>"#;

/// Login posts the form with credentials, then the session cookie opens the statement
#[tokio::test]
async fn test_scrape_statement() {
    let mut server = mockito::Server::new_async().await;

    let home = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(HOME_PAGE)
        .create_async()
        .await;

    let login = server
        .mock("POST", "/account/login")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("__RequestVerificationToken".into(), "csrf-42".into()),
            Matcher::UrlEncoded("UserName".into(), "driver@example.com".into()),
            Matcher::UrlEncoded("Password".into(), "p@ss word".into()),
        ]))
        .with_status(200)
        .with_header("set-cookie", "session=abc123; Path=/")
        .with_body("<html><body>Welcome</body></html>")
        .create_async()
        .await;

    let statement = server
        .mock("GET", "/account/statement")
        .match_header("cookie", Matcher::Regex("session=abc123".into()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(STATEMENT_PAGE)
        .create_async()
        .await;

    let scraper = PortalScraper::new(
        &format!("{}/", server.url()),
        &format!("{}/account/statement", server.url()),
        "driver@example.com",
        "p@ss word",
    )
    .unwrap();

    let html = scraper.fetch_statement_table_html().await.unwrap();

    home.assert_async().await;
    login.assert_async().await;
    statement.assert_async().await;

    let records = normalize_statement(
        &html,
        Period::new(2023, 3).unwrap(),
        &PrefixRules::default(),
    )
    .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location, "Bedford Plaza");
}

/// A rejected login surfaces as a portal error
#[tokio::test]
async fn test_login_rejected() {
    let mut server = mockito::Server::new_async().await;

    let _home = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(HOME_PAGE)
        .create_async()
        .await;
    let _login = server
        .mock("POST", "/account/login")
        .with_status(403)
        .create_async()
        .await;

    let scraper = PortalScraper::new(
        &format!("{}/", server.url()),
        &format!("{}/account/statement", server.url()),
        "driver",
        "wrong",
    )
    .unwrap();

    let err = scraper.fetch_statement_table_html().await.unwrap_err();
    assert!(matches!(err, Error::Portal(_)));
}

/// A statement page without the table container is an error
#[tokio::test]
async fn test_statement_table_missing() {
    let mut server = mockito::Server::new_async().await;

    let _home = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(HOME_PAGE)
        .create_async()
        .await;
    let _login = server
        .mock("POST", "/account/login")
        .with_status(200)
        .create_async()
        .await;
    let _statement = server
        .mock("GET", "/account/statement")
        .with_status(200)
        .with_body("<html><body>Your session has expired</body></html>")
        .create_async()
        .await;

    let scraper = PortalScraper::new(
        &format!("{}/", server.url()),
        &format!("{}/account/statement", server.url()),
        "driver",
        "secret",
    )
    .unwrap();

    let err = scraper.fetch_statement_table_html().await.unwrap_err();
    assert!(matches!(err, Error::Portal(_)));
}
