use shared::models::TrackReference;

pub(super) const APOLOGY_TEXT: &str = "抱歉，處理您的訊息時發生錯誤，請稍後再試。";

pub(super) const WELCOME_TEXT: &str = "嗨！謝謝你加我為好友 🎶\n輸入「說明」可以查看我會做的事，例如推薦歌曲、查天氣，或是單純陪你聊天。";

pub(super) const HELP_TEXT: &str = "可以使用的指令：\n\
• 連接spotify：連結你的 Spotify 帳號\n\
• 推薦歌曲：隨機推薦一首好歌\n\
• 搜尋 <歌名或歌手>：搜尋 Spotify 歌曲並加入歌單\n\
• 歌單：取得推薦歌單連結\n\
• <縣市>天氣：查詢 36 小時天氣預報\n\
• 地震：查詢最新地震報告\n\
• 摘要：整理目前的對話重點\n\
• 清空：清除對話紀錄\n\
其他訊息會直接和 AI 聊天。";

pub(super) const USER_REQUIRED_TEXT: &str = "請先加我為好友，才能使用這個功能喔！";

pub(super) const CONNECT_FIRST_TEXT: &str = "請先輸入「連接spotify」完成授權，才能使用這個功能喔！";

pub(super) const SEARCH_USAGE_TEXT: &str = "請輸入要搜尋的歌名或歌手，例如：搜尋 周杰倫 晴天";

pub(super) const NO_TRACKS_TEXT: &str = "目前沒有可以推薦的歌曲，請稍後再試。";

pub(super) const HISTORY_CLEARED_TEXT: &str = "已清空對話紀錄。";

pub(super) const EMPTY_HISTORY_TEXT: &str = "目前沒有對話紀錄可以摘要。";

pub(super) fn connect_prompt(authorize_url: &str) -> String {
    format!(
        "請點擊以下連結以連接你的Spotify帳戶: {authorize_url}，連結後你可以輸入「推薦歌曲」，來獲得好歌推薦！"
    )
}

pub(super) fn recommendation(track: &TrackReference) -> String {
    format!("推薦歌曲：{} - {}\n{}", track.name, track.artist, track.url)
}

pub(super) fn no_search_results(terms: &str) -> String {
    format!("找不到「{terms}」的相關歌曲，換個關鍵字試試看吧！")
}

pub(super) fn playlist(url: &str) -> String {
    format!("這是我們的推薦歌單：{url}")
}

pub(super) fn summary(text: &str) -> String {
    format!("對話摘要：\n{text}")
}

pub(super) fn unknown_location(location: &str) -> String {
    format!("找不到「{location}」的天氣資訊，請輸入縣市名稱，例如：臺北市天氣。")
}
