use xxxgfporn_api::{parse_categories, parse_video_list, total_pages};

#[test]
fn article_cards_are_extracted_in_document_order() {
    let html = r#"
        <html><body>
          <article class="thumb-block">
            <a href="/video/201/"><img data-src="/t/201.jpg"></a>
            <span class="title">Morning Clip</span>
            <span class="duration">8:20</span>
          </article>
          <article class="thumb-block">
            <a href="/video/202/"><img src="/t/202.jpg"></a>
            <span class="title">Evening Clip</span>
          </article>
        </body></html>
    "#;

    let videos = parse_video_list(html);
    assert_eq!(videos.len(), 2);

    assert_eq!(videos[0].id, "201");
    assert_eq!(videos[0].url, "https://www.xxxgfporn.com/video/201/");
    assert_eq!(videos[0].title.as_deref(), Some("Morning Clip"));
    assert_eq!(
        videos[0].thumbnail.as_deref(),
        Some("https://www.xxxgfporn.com/t/201.jpg")
    );
    assert_eq!(videos[0].duration.as_deref(), Some("8:20"));

    assert_eq!(videos[1].id, "202");
    assert!(videos[1].duration.is_none());
}

#[test]
fn short_detail_links_fall_back_to_the_link_scan() {
    let html = r#"
        <html><body>
          <nav><a href="/categories/">Categories</a> <a href="/login">Login</a></nav>
          <a href="/v/backyard-clip/" title="Backyard Clip">watch</a>
          <a href="/v/garage-clip/">Garage Clip</a>
        </body></html>
    "#;

    let videos = parse_video_list(html);
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "backyard-clip");
    assert_eq!(videos[0].title.as_deref(), Some("Backyard Clip"));
    assert_eq!(videos[1].id, "garage-clip");
    assert_eq!(videos[1].title.as_deref(), Some("Garage Clip"));
}

#[test]
fn pagination_count_is_read_alongside_the_list() {
    let html = r#"
        <html><body>
          <div class="video-item">
            <a href="/video/7/"><img src="/t/7.jpg"></a>
            <span class="title">Seven</span>
          </div>
          <div class="pagination">
            <a href="/latest/?page=2">2</a>
            <a href="/latest/?page=34">Last</a>
          </div>
        </body></html>
    "#;

    assert_eq!(parse_video_list(html).len(), 1);
    assert_eq!(total_pages(html), 34);
    assert_eq!(total_pages("<html><body>no pager</body></html>"), 1);
}

#[test]
fn categories_index_yields_name_slug_and_url() {
    let html = r#"
        <html><body>
          <ul>
            <li><a href="/category/amateur/">Amateur <span>(1,204)</span></a></li>
            <li><a href="/category/homemade/">Homemade</a></li>
            <li><a href="/video/5/">Some video</a></li>
          </ul>
        </body></html>
    "#;

    let cats = parse_categories(html);
    assert_eq!(cats.len(), 2);
    assert_eq!(cats[0].slug, "amateur");
    assert_eq!(cats[0].url, "https://www.xxxgfporn.com/category/amateur/");
    assert!(cats[0].name.starts_with("Amateur"));
    assert_eq!(cats[1].slug, "homemade");
}

#[test]
fn a_page_without_videos_is_empty_not_an_error() {
    let html = r#"
        <html><body>
          <h1>Terms of Service</h1>
          <p>Nothing to watch here.</p>
        </body></html>
    "#;

    assert!(parse_video_list(html).is_empty());
}
